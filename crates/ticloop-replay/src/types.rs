//! Data types for demo recording and playback.

use ticloop_core::{ParticipantId, TicSet};
use ticloop_engine::{SessionSettings, SyncMode};

/// Non-vanilla extensions a demo stream uses.
///
/// Stored as one byte in the header. Every set bit is an extension that
/// vanilla playback would not understand, so both recording and playback
/// of a flagged demo go through [`DemoPolicy`](crate::DemoPolicy).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DemoFlags(u8);

impl DemoFlags {
    /// Full 16-bit turn deltas. Vanilla keeps only the high byte.
    pub const LONG_TICS: DemoFlags = DemoFlags(0x01);
    /// A 64-bit engine state digest follows every frame.
    pub const DIGESTS: DemoFlags = DemoFlags(0x02);

    const KNOWN: u8 = 0x03;

    /// No extensions.
    pub const fn empty() -> Self {
        DemoFlags(0)
    }

    /// Rebuild from the header byte. `None` if unknown bits are set.
    pub fn from_bits(bits: u8) -> Option<Self> {
        (bits & !Self::KNOWN == 0).then_some(DemoFlags(bits))
    }

    /// The header byte.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: DemoFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`.
    pub fn insert(&mut self, other: DemoFlags) {
        self.0 |= other.0;
    }

    /// Whether no extension is used.
    pub fn is_vanilla(self) -> bool {
        self.0 == 0
    }
}

/// Session parameters stored at the start of a demo.
///
/// Enough to bootstrap an identical session for playback.
///
/// # Examples
///
/// ```
/// use ticloop_engine::SessionSettings;
/// use ticloop_replay::{DemoFlags, DemoHeader};
///
/// let header = DemoHeader::from_settings(&SessionSettings::default());
/// assert_eq!(header.participants, 1);
/// assert!(header.flags.is_vanilla());
/// assert_eq!(header.to_settings().ticdup, 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemoHeader {
    /// Participant slots in the session.
    pub participants: u8,
    /// The recording participant.
    pub local: ParticipantId,
    /// Simulation steps per tic.
    pub ticdup: u32,
    /// Sync mode of the recording session.
    pub sync_mode: SyncMode,
    /// Whether the recording participant was a spectator.
    pub drone: bool,
    /// Opaque class index of the recording participant.
    pub player_class: u8,
    /// Extensions the stream uses.
    pub flags: DemoFlags,
}

impl DemoHeader {
    /// Header for a session, with no extensions.
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self {
            participants: settings.participants as u8,
            local: settings.local,
            ticdup: settings.ticdup,
            sync_mode: settings.sync_mode,
            drone: settings.drone,
            player_class: settings.player_class,
            flags: DemoFlags::empty(),
        }
    }

    /// Session settings that reproduce the recorded session.
    pub fn to_settings(&self) -> SessionSettings {
        SessionSettings {
            participants: usize::from(self.participants),
            local: self.local,
            ticdup: self.ticdup,
            sync_mode: self.sync_mode,
            drone: self.drone,
            player_class: self.player_class,
            ..SessionSettings::default()
        }
    }
}

/// One simulation step's worth of recorded data.
///
/// # Examples
///
/// ```
/// use ticloop_core::TicSet;
/// use ticloop_replay::DemoFrame;
///
/// let frame = DemoFrame { tic: 3, set: TicSet::default(), digest: None };
/// assert_eq!(frame.set.present_count(), 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemoFrame {
    /// Simulation step index (counts duplicated steps individually).
    pub tic: u64,
    /// Commands and presence passed to the step.
    pub set: TicSet,
    /// Engine state digest after the step, when the demo records them.
    pub digest: Option<u64>,
}
