//! Per-session state: parameters, cursors, the command ring, and
//! participant presence.
//!
//! A [`SessionContext`] is a plain value owned by the scheduler. Nothing
//! here is process-wide, so independent sessions can run side by side
//! (and do, in tests).

use log::info;
use ticloop_core::{ParticipantId, SessionError, TicIndex, MAX_PARTICIPANTS};

use crate::config::{SessionSettings, SyncMode};
use crate::ring::TicRing;

/// Values fixed at bootstrap and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionParams {
    /// Participants in the session.
    pub participants: usize,
    /// The local participant's slot.
    pub local: ParticipantId,
    /// Simulation steps per sampled command.
    pub ticdup: u64,
    /// Tic-count policy.
    pub sync_mode: SyncMode,
    /// Already-sent tics repeated in each outbound packet.
    pub extra_tics: usize,
    /// The local participant spectates and contributes no commands.
    pub drone: bool,
    /// Requested player class, for the game setup collaborator.
    pub player_class: u8,
}

/// The monotonically increasing session cursors.
///
/// `produced`, `received` and `sent` count command slots. `simulated`
/// counts simulation steps, so the slot it is consuming is
/// `simulated / ticdup`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursors {
    /// Next tic the local producer will fill.
    pub produced: TicIndex,
    /// Next tic expected from remote intake.
    pub received: TicIndex,
    /// Next simulation step the engine will run.
    pub simulated: u64,
    /// Next local tic not yet offered to the transport.
    pub sent: TicIndex,
}

/// Everything the scheduler knows about one session.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub(crate) params: SessionParams,
    pub(crate) cursors: Cursors,
    pub(crate) ring: TicRing,
    pub(crate) active: [bool; MAX_PARTICIPANTS],
    pub(crate) connected: bool,
    pub(crate) finished: bool,
}

impl SessionContext {
    /// Build a fresh session from negotiated settings.
    ///
    /// Validates the settings, assigns the local slot, marks participants
    /// `0..participants` active, and starts every cursor at zero.
    /// `networked` says whether remote peers feed this session.
    pub fn bootstrap(
        settings: &SessionSettings,
        ring_capacity: usize,
        networked: bool,
    ) -> Result<Self, SessionError> {
        settings.validate()?;

        let mut active = [false; MAX_PARTICIPANTS];
        for (i, slot) in active.iter_mut().enumerate() {
            *slot = i < settings.participants;
        }

        info!(
            "session bootstrap: {} participant(s), local {}, ticdup {}, {:?}{}{}",
            settings.participants,
            settings.local,
            settings.ticdup,
            settings.sync_mode,
            if networked { ", networked" } else { "" },
            if settings.drone { ", drone" } else { "" },
        );

        Ok(Self {
            params: SessionParams {
                participants: settings.participants,
                local: settings.local,
                ticdup: u64::from(settings.ticdup),
                sync_mode: settings.sync_mode,
                extra_tics: settings.extra_tics,
                drone: settings.drone,
                player_class: settings.player_class,
            },
            cursors: Cursors::default(),
            ring: TicRing::new(ring_capacity),
            active,
            connected: networked,
            finished: false,
        })
    }

    /// Session parameters.
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Current cursor values.
    pub fn cursors(&self) -> Cursors {
        self.cursors
    }

    /// The command ring.
    pub fn ring(&self) -> &TicRing {
        &self.ring
    }

    /// Participants active as of the last executed step (or bootstrap).
    pub fn active(&self) -> &[bool; MAX_PARTICIPANTS] {
        &self.active
    }

    /// Whether a networked transport is still feeding remote commands.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether [`quit`](Self::quit) has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// End the session. Subsequent frames report session end.
    pub fn quit(&mut self) {
        if !self.finished {
            info!("session quit at tic {}", self.simulated_tic());
        }
        self.finished = true;
    }

    /// The command slot the simulation is consuming.
    pub fn simulated_tic(&self) -> TicIndex {
        TicIndex(self.cursors.simulated / self.params.ticdup)
    }

    /// How far local production runs ahead of simulation, in tics.
    pub fn ahead_by(&self) -> i64 {
        self.cursors.produced.0 as i64 - self.simulated_tic().0 as i64
    }

    /// The highest tic (exclusive) whose commands are complete.
    ///
    /// Local production bounds it; while a networked transport is
    /// connected, remote intake bounds it as well. A connected drone
    /// produces nothing, so only remote intake counts.
    pub fn low_tic(&self) -> TicIndex {
        let produced = self.cursors.produced;
        if self.connected && (self.params.drone || self.cursors.received < produced) {
            self.cursors.received
        } else {
            produced
        }
    }

    /// Complete tics not yet simulated.
    pub fn available(&self) -> u64 {
        self.low_tic().0.saturating_sub(self.simulated_tic().0)
    }

    /// Whether anyone is left to simulate for.
    ///
    /// A participating local player always counts. A drone only sees
    /// remote participants, and only while connected.
    pub fn players_in_game(&self) -> bool {
        if self.finished {
            return false;
        }
        if !self.params.drone {
            return true;
        }
        self.connected && self.active.iter().any(|&a| a)
    }

    /// The lowest active participant slot, if any. That participant's
    /// clock is the reference the others adapt to.
    pub fn key_participant(&self) -> Option<ParticipantId> {
        self.active
            .iter()
            .position(|&a| a)
            .map(|i| ParticipantId(i as u8))
    }

    /// Whether remote intake has room for another tic without reusing a
    /// slot the simulation has not consumed yet.
    pub fn intake_has_room(&self) -> bool {
        let behind = self.cursors.received.0.saturating_sub(self.simulated_tic().0);
        behind < self.ring.capacity() as u64
    }
}
