//! Session settings, scheduler configuration, validation, and error types.
//!
//! [`SessionSettings`] carries the values negotiated for one session
//! (participants, local slot, duplication factor, sync mode).
//! [`SchedulerConfig`] carries local tuning that never crosses the wire
//! (ring capacity, stall guard, wait slice). Both are validated once,
//! when the scheduler is constructed.

use std::error::Error;
use std::fmt;

use ticloop_core::{ParticipantId, SessionError, BACKUP_TICS, MAX_PARTICIPANTS};

/// Largest accepted extra-tics redundancy hint.
pub const MAX_EXTRA_TICS: usize = 8;

/// Smallest accepted command ring capacity.
///
/// Local production may run at most 8 tics ahead of simulation, so the
/// ring must comfortably cover that window plus in-flight remote tics.
pub const MIN_RING_CAPACITY: usize = 16;

// ── SyncMode ───────────────────────────────────────────────────────

/// Policy for choosing how many tics to run per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SyncMode {
    /// Run whatever is available. The transport's clock-skew offset is
    /// applied to the tic clock.
    #[default]
    FixedAvailability,
    /// Blend real elapsed time against availability, and let non-key
    /// participants correct drift by rewinding their pacing clock.
    Adaptive,
}

impl SyncMode {
    /// Whether the transport's clock-skew offset affects the tic clock.
    pub fn applies_offset(self) -> bool {
        matches!(self, Self::FixedAvailability)
    }
}

// ── SessionSettings ────────────────────────────────────────────────

/// Settings negotiated at session start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    /// Number of participants in the session. Default: 1.
    pub participants: usize,
    /// The local participant's slot. Default: 0.
    pub local: ParticipantId,
    /// Simulation steps per sampled command. Default: 1. Minimum: 1.
    pub ticdup: u32,
    /// Tic-count policy. Default: [`SyncMode::FixedAvailability`].
    pub sync_mode: SyncMode,
    /// Already-sent tics repeated in each outbound packet. Default: 1.
    pub extra_tics: usize,
    /// Spectate without contributing commands. Default: false.
    pub drone: bool,
    /// Requested player class, forwarded to game setup. Default: 0.
    pub player_class: u8,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            participants: 1,
            local: ParticipantId(0),
            ticdup: 1,
            sync_mode: SyncMode::default(),
            extra_tics: 1,
            drone: false,
            player_class: 0,
        }
    }
}

impl SessionSettings {
    /// Check the negotiated values before a session is built from them.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.participants == 0 || self.participants > MAX_PARTICIPANTS {
            return Err(SessionError::InvalidParticipantCount {
                count: self.participants,
            });
        }
        if self.local.index() >= self.participants {
            return Err(SessionError::LocalIndexOutOfRange {
                index: self.local.index(),
                count: self.participants,
            });
        }
        if self.ticdup == 0 {
            return Err(SessionError::ZeroTicdup);
        }
        if self.extra_tics > MAX_EXTRA_TICS {
            return Err(SessionError::ExtraTicsTooLarge {
                value: self.extra_tics,
                max: MAX_EXTRA_TICS,
            });
        }
        Ok(())
    }
}

// ── SchedulerConfig ────────────────────────────────────────────────

/// Local scheduler tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Number of tic slots in the command ring. Default: 128. Minimum: 16.
    pub ring_capacity: usize,
    /// Real tics a frame may wait for missing input before giving up.
    /// Default: 5. Minimum: 1.
    pub stall_guard_tics: u64,
    /// Longest single block on the transport while waiting, in
    /// milliseconds. Default: 1. Minimum: 1.
    pub wait_slice_ms: u64,
    /// Produce exactly one local tic per frame instead of pacing against
    /// the clock (demo timing). Default: false.
    pub single_tics: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            ring_capacity: BACKUP_TICS,
            stall_guard_tics: 5,
            wait_slice_ms: 1,
            single_tics: false,
        }
    }
}

impl SchedulerConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ring_capacity < MIN_RING_CAPACITY {
            return Err(ConfigError::RingTooSmall {
                configured: self.ring_capacity,
            });
        }
        if self.stall_guard_tics == 0 {
            return Err(ConfigError::ZeroStallGuard);
        }
        if self.wait_slice_ms == 0 {
            return Err(ConfigError::ZeroWaitSlice);
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while constructing a scheduler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Negotiated session settings are invalid.
    Session(SessionError),
    /// Ring capacity is below [`MIN_RING_CAPACITY`].
    RingTooSmall {
        /// The configured capacity.
        configured: usize,
    },
    /// `stall_guard_tics` is zero.
    ZeroStallGuard,
    /// `wait_slice_ms` is zero.
    ZeroWaitSlice,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "session: {e}"),
            Self::RingTooSmall { configured } => write!(
                f,
                "ring_capacity {configured} is below minimum of {MIN_RING_CAPACITY}"
            ),
            Self::ZeroStallGuard => write!(f, "stall_guard_tics must be at least 1"),
            Self::ZeroWaitSlice => write!(f, "wait_slice_ms must be at least 1"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Session(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SessionError> for ConfigError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SessionSettings::default().validate().is_ok());
        assert!(SchedulerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_participants_rejected() {
        let s = SessionSettings {
            participants: 0,
            ..SessionSettings::default()
        };
        assert_eq!(
            s.validate(),
            Err(SessionError::InvalidParticipantCount { count: 0 })
        );
    }

    #[test]
    fn too_many_participants_rejected() {
        let s = SessionSettings {
            participants: MAX_PARTICIPANTS + 1,
            ..SessionSettings::default()
        };
        assert!(matches!(
            s.validate(),
            Err(SessionError::InvalidParticipantCount { .. })
        ));
    }

    #[test]
    fn local_index_outside_session_rejected() {
        let s = SessionSettings {
            participants: 2,
            local: ParticipantId(2),
            ..SessionSettings::default()
        };
        assert_eq!(
            s.validate(),
            Err(SessionError::LocalIndexOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn zero_ticdup_rejected() {
        let s = SessionSettings {
            ticdup: 0,
            ..SessionSettings::default()
        };
        assert_eq!(s.validate(), Err(SessionError::ZeroTicdup));
    }

    #[test]
    fn oversized_extra_tics_rejected() {
        let s = SessionSettings {
            extra_tics: MAX_EXTRA_TICS + 1,
            ..SessionSettings::default()
        };
        assert!(matches!(
            s.validate(),
            Err(SessionError::ExtraTicsTooLarge { .. })
        ));
    }

    #[test]
    fn small_ring_rejected() {
        let c = SchedulerConfig {
            ring_capacity: 8,
            ..SchedulerConfig::default()
        };
        match c.validate() {
            Err(ConfigError::RingTooSmall { configured: 8 }) => {}
            other => panic!("expected RingTooSmall, got {other:?}"),
        }
    }

    #[test]
    fn zero_stall_guard_rejected() {
        let c = SchedulerConfig {
            stall_guard_tics: 0,
            ..SchedulerConfig::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::ZeroStallGuard));
    }

    #[test]
    fn session_error_is_source() {
        let err = ConfigError::from(SessionError::ZeroTicdup);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "session: ticdup must be at least 1");
    }

    #[test]
    fn only_fixed_availability_applies_offset() {
        assert!(SyncMode::FixedAvailability.applies_offset());
        assert!(!SyncMode::Adaptive.applies_offset());
    }
}
