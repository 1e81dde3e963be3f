//! Strongly-typed identifiers for tics and participants.

use std::fmt;

/// Maximum number of participants in one session.
///
/// Every [`TicSet`](crate::TicSet) carries one command column per
/// participant slot, present or not.
pub const MAX_PARTICIPANTS: usize = 8;

/// Index of a tic in the session's global tic sequence.
///
/// Tic indices count sampled command slots, not simulation steps: with a
/// duplication factor of `n`, one `TicIndex` covers `n` steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TicIndex(pub u64);

impl TicIndex {
    /// The following tic.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TicIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TicIndex {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a participant slot within a session (`0..MAX_PARTICIPANTS`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u8);

impl ParticipantId {
    /// The participant slot as an array index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this id addresses a valid participant slot.
    pub fn is_valid(self) -> bool {
        self.index() < MAX_PARTICIPANTS
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ParticipantId {
    fn from(v: u8) -> Self {
        Self(v)
    }
}
