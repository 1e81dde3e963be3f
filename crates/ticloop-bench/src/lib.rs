//! Benchmark profiles and utilities for the ticloop scheduler.
//!
//! Provides pre-built session profiles for benchmarking:
//!
//! - [`reference_profile`]: four participants, fixed availability
//! - [`stress_profile`]: eight participants, adaptive sync, ticdup 2
//! - [`remote_script`]: deterministic remote input for a profile

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ticloop_core::{ParticipantId, RemoteBatch, TicCmd, TicSet, MAX_PARTICIPANTS};
use ticloop_engine::{SchedulerConfig, SessionSettings, SyncMode};

/// Negotiated settings plus local tuning for one benchmark run.
#[derive(Clone, Debug)]
pub struct BenchProfile {
    /// Session settings.
    pub settings: SessionSettings,
    /// Scheduler tuning.
    pub config: SchedulerConfig,
}

/// Four participants, fixed availability, one redundant tic per packet.
pub fn reference_profile() -> BenchProfile {
    BenchProfile {
        settings: SessionSettings {
            participants: 4,
            local: ParticipantId(0),
            ticdup: 1,
            sync_mode: SyncMode::FixedAvailability,
            extra_tics: 1,
            ..SessionSettings::default()
        },
        config: SchedulerConfig::default(),
    }
}

/// A full table of participants in adaptive mode with every command
/// repeated twice.
pub fn stress_profile() -> BenchProfile {
    BenchProfile {
        settings: SessionSettings {
            participants: MAX_PARTICIPANTS,
            local: ParticipantId(0),
            ticdup: 2,
            sync_mode: SyncMode::Adaptive,
            extra_tics: 2,
            ..SessionSettings::default()
        },
        config: SchedulerConfig::default(),
    }
}

/// Deterministic command for participant `p` at tic `tic`.
fn scripted_cmd(p: usize, tic: u64, seed: u64) -> TicCmd {
    let bits = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add((tic * MAX_PARTICIPANTS as u64 + p as u64) * 1442695040888963407);
    TicCmd {
        forward_move: (bits >> 8) as i8 / 2,
        side_move: (bits >> 16) as i8 / 4,
        angle_turn: (bits >> 24) as i16,
        consistency: tic as u16,
        chat_char: 0,
        buttons: (bits >> 40) as u8 & 0x03,
    }
}

/// One remote batch per tic carrying a command for every participant
/// except the local one.
pub fn remote_script(settings: &SessionSettings, tics: u64, seed: u64) -> Vec<RemoteBatch> {
    (0..tics)
        .map(|tic| {
            (0..settings.participants)
                .filter(|&p| p != settings.local.index())
                .fold(RemoteBatch::empty(), |batch, p| {
                    batch.with(ParticipantId(p as u8), scripted_cmd(p, tic, seed))
                })
        })
        .collect()
}

/// A tic set with the first `participants` slots present.
pub fn sample_tic_set(participants: usize, seed: u64) -> TicSet {
    let mut set = TicSet::default();
    for p in 0..participants.min(MAX_PARTICIPANTS) {
        set.present[p] = true;
        set.commands[p] = scripted_cmd(p, 0, seed);
    }
    set
}
