//! Demo playback and determinism verification.
//!
//! [`verify_demo`] feeds a recorded demo through a fresh engine and checks
//! the engine's state digest against the recorded one after every step.
//! [`compare_streams`] checks two recordings for identical input.

use std::io::Read;

use log::warn;
use ticloop_core::{SimulationEngine, StateDigest};

use crate::compat::{DemoPolicy, DemoSource};
use crate::error::ReplayError;
use crate::hash::tic_set_hash;
use crate::reader::DemoReader;
use crate::recorder::{DIGESTS_FEATURE, LONG_TICS_FEATURE};
use crate::types::{DemoFlags, DemoFrame, DemoHeader};

/// The first step at which replayed state left the recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DivergenceReport {
    /// The step at which divergence was detected.
    pub tic: u64,
    /// Digest from the demo.
    pub recorded: u64,
    /// Digest of the replayed engine.
    pub replayed: u64,
    /// Hash of the tic set stepped at `tic`.
    pub input_hash: u64,
}

impl DivergenceReport {
    /// The report as a [`ReplayError::DigestMismatch`].
    pub fn into_error(self) -> ReplayError {
        ReplayError::DigestMismatch {
            tic: self.tic,
            recorded: self.recorded,
            replayed: self.replayed,
        }
    }
}

/// Outcome of a [`verify_demo`] run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    /// Frames played back (up to and including a divergent one).
    pub frames: u64,
    /// Frames whose digest was checked.
    pub checked: u64,
    /// FNV-1a hash over the tic sets played back.
    pub stream_hash: u64,
    /// The first divergence, if any.
    pub divergence: Option<DivergenceReport>,
}

impl VerifyReport {
    /// Whether every checked digest matched.
    pub fn is_clean(&self) -> bool {
        self.divergence.is_none()
    }
}

/// Check that playback of a demo from `source` may honour every extension
/// its header declares.
pub fn check_playback_extensions(
    header: &DemoHeader,
    source: DemoSource,
    policy: &DemoPolicy,
) -> Result<(), ReplayError> {
    let checks = [
        (DemoFlags::LONG_TICS, LONG_TICS_FEATURE),
        (DemoFlags::DIGESTS, DIGESTS_FEATURE),
    ];
    for (flag, feature) in checks {
        let used = header.flags.contains(flag);
        if used && !policy.allow_playback_extension(used, source, feature) {
            return Err(ReplayError::ExtensionRefused { feature });
        }
    }
    Ok(())
}

/// Play a demo through a caller-provided step function and compare state
/// digests at every step that recorded one.
///
/// The `step_fn` closure receives each frame, steps the simulation, and
/// returns the digest of the resulting state. Returns `Ok(None)` if all
/// recorded digests match, or `Ok(Some(report))` at the first divergence.
pub fn replay_and_compare<R: Read>(
    reader: &mut DemoReader<R>,
    step_fn: &mut dyn FnMut(&DemoFrame) -> Result<u64, ReplayError>,
) -> Result<Option<DivergenceReport>, ReplayError> {
    while let Some(frame) = reader.next_frame()? {
        let replayed = step_fn(&frame)?;
        if let Some(recorded) = frame.digest {
            if recorded != replayed {
                return Ok(Some(DivergenceReport {
                    tic: frame.tic,
                    recorded,
                    replayed,
                    input_hash: tic_set_hash(&frame.set),
                }));
            }
        }
    }
    Ok(None)
}

/// Replay a demo through `engine`, which must start in the same state the
/// recording engine started in.
///
/// Refuses demos whose extensions the policy does not allow for `source`.
pub fn verify_demo<R, E>(
    mut reader: DemoReader<R>,
    engine: &mut E,
    source: DemoSource,
    policy: &DemoPolicy,
) -> Result<VerifyReport, ReplayError>
where
    R: Read,
    E: SimulationEngine + StateDigest,
{
    check_playback_extensions(reader.header(), source, policy)?;

    let mut checked = 0u64;
    let divergence = replay_and_compare(&mut reader, &mut |frame| {
        engine.step_simulation(&frame.set.commands, &frame.set.present);
        if frame.digest.is_some() {
            checked += 1;
        }
        Ok(engine.digest())
    })?;

    if let Some(d) = &divergence {
        warn!(
            "demo diverged at tic {}: recorded {:#018x}, replayed {:#018x}",
            d.tic,
            d.recorded,
            d.replayed
        );
    }

    Ok(VerifyReport {
        frames: reader.frames_read(),
        checked,
        stream_hash: reader.stream_hash(),
        divergence,
    })
}

/// Compare the input of two recordings step by step.
///
/// Returns the first step at which the recorded tic sets differ, or at
/// which one stream ends before the other; `None` if they are identical.
/// Headers are not compared, since peers of one session record different
/// local slots.
pub fn compare_streams<A: Read, B: Read>(
    a: DemoReader<A>,
    b: DemoReader<B>,
) -> Result<Option<u64>, ReplayError> {
    let mut a = a.frames();
    let mut b = b.frames();
    let mut step = 0u64;
    loop {
        match (a.next().transpose()?, b.next().transpose()?) {
            (None, None) => return Ok(None),
            (Some(fa), Some(fb)) if fa.set == fb.set => step += 1,
            _ => return Ok(Some(step)),
        }
    }
}
