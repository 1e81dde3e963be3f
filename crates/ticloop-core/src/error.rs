//! Error types for session setup.
//!
//! The scheduler path itself never fails: pacing refusal is a `bool`,
//! stalls and session end are frame outcomes. The only fallible step is
//! validating negotiated session settings at bootstrap.

use std::error::Error;
use std::fmt;

use crate::id::MAX_PARTICIPANTS;

/// Errors detected while validating negotiated session settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// Participant count is zero or exceeds [`MAX_PARTICIPANTS`].
    InvalidParticipantCount {
        /// The requested count.
        count: usize,
    },
    /// Local participant index is outside the session.
    LocalIndexOutOfRange {
        /// The requested local index.
        index: usize,
        /// Number of participants in the session.
        count: usize,
    },
    /// Duplication factor is zero.
    ZeroTicdup,
    /// The extra-tics hint exceeds the supported redundancy window.
    ExtraTicsTooLarge {
        /// The requested hint.
        value: usize,
        /// Largest accepted value.
        max: usize,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParticipantCount { count } => write!(
                f,
                "participant count {count} is outside 1..={MAX_PARTICIPANTS}"
            ),
            Self::LocalIndexOutOfRange { index, count } => write!(
                f,
                "local participant index {index} is outside a session of {count}"
            ),
            Self::ZeroTicdup => write!(f, "ticdup must be at least 1"),
            Self::ExtraTicsTooLarge { value, max } => {
                write!(f, "extra_tics {value} exceeds maximum of {max}")
            }
        }
    }
}

impl Error for SessionError {}
