//! The per-tic input record and the per-tic participant set.

use crate::id::{ParticipantId, MAX_PARTICIPANTS};

/// Bit flags carried in [`TicCmd::buttons`].
///
/// When [`SPECIAL`](Buttons::SPECIAL) is set the remaining bits encode a
/// one-shot special action (pause, save) instead of held buttons.
pub struct Buttons;

impl Buttons {
    /// Primary action held.
    pub const ATTACK: u8 = 0x01;
    /// Interact held.
    pub const USE: u8 = 0x02;
    /// The byte encodes a one-shot special action.
    pub const SPECIAL: u8 = 0x80;
}

/// One participant's input for one tic.
///
/// Fixed-size and `Copy`: slots in the command ring are overwritten in
/// place rather than reallocated. A command is immutable once stored,
/// except for [`squash_duplicate`](TicCmd::squash_duplicate) applied when
/// the same command is replayed across duplicated sub-tics.
///
/// # Examples
///
/// ```
/// use ticloop_core::{Buttons, TicCmd};
///
/// let mut cmd = TicCmd {
///     forward_move: 25,
///     chat_char: b'h',
///     buttons: Buttons::SPECIAL | 0x01,
///     ..TicCmd::default()
/// };
/// cmd.squash_duplicate();
/// assert_eq!(cmd.forward_move, 25);
/// assert_eq!(cmd.chat_char, 0);
/// assert_eq!(cmd.buttons, 0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TicCmd {
    /// Forward/backward movement, signed.
    pub forward_move: i8,
    /// Strafe movement, signed.
    pub side_move: i8,
    /// Turn delta. Vanilla demos only keep the high byte.
    pub angle_turn: i16,
    /// Consistency check value echoed between peers.
    pub consistency: u16,
    /// Chat character typed during this tic, or 0.
    pub chat_char: u8,
    /// [`Buttons`] bit set.
    pub buttons: u8,
}

impl TicCmd {
    /// Whether the buttons byte encodes a special action.
    pub fn is_special(&self) -> bool {
        self.buttons & Buttons::SPECIAL != 0
    }

    /// Strip one-shot side effects so the command can be run again.
    ///
    /// Clears the chat character, and clears the whole buttons byte when it
    /// encodes a special action (the other bits are that action's payload).
    pub fn squash_duplicate(&mut self) {
        self.chat_char = 0;
        if self.is_special() {
            self.buttons = 0;
        }
    }
}

/// The complete set of commands for one tic.
///
/// One column per participant slot. `present[i]` says whether
/// participant `i` is in the game for this tic; `commands[i]` is
/// meaningless when it is not.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TicSet {
    /// Per-participant commands.
    pub commands: [TicCmd; MAX_PARTICIPANTS],
    /// Per-participant presence flags.
    pub present: [bool; MAX_PARTICIPANTS],
}

impl TicSet {
    /// Mark every participant except `local` as absent.
    ///
    /// Used by single-participant sessions so stale slot contents can never
    /// introduce phantom participants.
    pub fn clear_non_local(&mut self, local: ParticipantId) {
        for (i, present) in self.present.iter_mut().enumerate() {
            if i != local.index() {
                *present = false;
            }
        }
    }

    /// Apply [`TicCmd::squash_duplicate`] to every column.
    pub fn squash_duplicates(&mut self) {
        for cmd in &mut self.commands {
            cmd.squash_duplicate();
        }
    }

    /// Number of participants marked present.
    pub fn present_count(&self) -> usize {
        self.present.iter().filter(|&&p| p).count()
    }

    /// Presence flags packed into a bit mask (bit `i` = participant `i`).
    pub fn present_mask(&self) -> u8 {
        self.present
            .iter()
            .enumerate()
            .fold(0u8, |mask, (i, &p)| if p { mask | (1 << i) } else { mask })
    }
}

/// A complete set of remote commands for the next unreceived tic.
///
/// Delivered by the transport. The column belonging to the local
/// participant is ignored by intake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemoteBatch {
    /// Per-participant commands.
    pub commands: [TicCmd; MAX_PARTICIPANTS],
    /// Per-participant presence flags.
    pub present: [bool; MAX_PARTICIPANTS],
}

impl RemoteBatch {
    /// A batch in which every participant is absent.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set one participant's command and mark it present.
    pub fn with(mut self, participant: ParticipantId, cmd: TicCmd) -> Self {
        self.commands[participant.index()] = cmd;
        self.present[participant.index()] = true;
        self
    }
}
