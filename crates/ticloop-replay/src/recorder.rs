//! Demo recording as a [`SimulationEngine`] adapter.
//!
//! [`RecordingEngine`] wraps the host engine and sits between it and the
//! scheduler. Every executed step is written to the demo stream, and the
//! inner engine steps the commands exactly as the demo stores them, so a
//! recording session and its later playback see identical input.

use std::io::Write;

use log::{debug, warn};
use ticloop_core::{SimulationEngine, StateDigest, TicCmd, TicIndex, TicSet, MAX_PARTICIPANTS};
use ticloop_engine::SessionSettings;

use crate::codec::quantize_set;
use crate::compat::DemoPolicy;
use crate::error::ReplayError;
use crate::types::{DemoFlags, DemoFrame, DemoHeader};
use crate::writer::DemoWriter;

/// Name of the full-resolution turn extension, as reported in warnings.
pub const LONG_TICS_FEATURE: &str = "long tics";
/// Name of the per-step state digest extension.
pub const DIGESTS_FEATURE: &str = "state digests";

/// Records every executed step of the wrapped engine.
///
/// Writing never interrupts the simulation: the first I/O error stops
/// recording, is logged, and is returned by
/// [`finish()`](RecordingEngine::finish).
pub struct RecordingEngine<E, W: Write> {
    inner: E,
    writer: DemoWriter<W>,
    digest: Option<fn(&E) -> u64>,
    next_tic: u64,
    error: Option<ReplayError>,
}

impl<E: SimulationEngine, W: Write> RecordingEngine<E, W> {
    /// Start recording to `sink`, writing the header immediately.
    ///
    /// `long_tics` asks for full-resolution turn deltas; the policy decides
    /// whether the demo actually gets them.
    pub fn new(
        inner: E,
        sink: W,
        settings: &SessionSettings,
        long_tics: bool,
        policy: &DemoPolicy,
    ) -> Result<Self, ReplayError> {
        Self::start(inner, sink, settings, long_tics, None, policy)
    }

    fn start(
        inner: E,
        sink: W,
        settings: &SessionSettings,
        long_tics: bool,
        digest: Option<fn(&E) -> u64>,
        policy: &DemoPolicy,
    ) -> Result<Self, ReplayError> {
        let mut header = DemoHeader::from_settings(settings);
        if policy.allow_record_extension(long_tics, LONG_TICS_FEATURE) {
            header.flags.insert(DemoFlags::LONG_TICS);
        }
        let digest = digest.filter(|_| policy.allow_record_extension(true, DIGESTS_FEATURE));
        if digest.is_some() {
            header.flags.insert(DemoFlags::DIGESTS);
        }
        debug!("demo recording started (extensions {:#04x})", header.flags.bits());

        Ok(Self {
            inner,
            writer: DemoWriter::new(sink, &header)?,
            digest,
            next_tic: 0,
            error: None,
        })
    }

    /// The header written at the start of the demo.
    pub fn header(&self) -> &DemoHeader {
        self.writer.header()
    }

    /// The wrapped engine.
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Mutable access to the wrapped engine.
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.inner
    }

    /// Steps recorded so far.
    pub fn frames_recorded(&self) -> u64 {
        self.writer.frames_written()
    }

    /// FNV-1a hash over every recorded tic set so far.
    pub fn stream_hash(&self) -> u64 {
        self.writer.stream_hash()
    }

    /// The error that stopped recording, if any.
    pub fn error(&self) -> Option<&ReplayError> {
        self.error.as_ref()
    }

    /// Flush the demo and hand back the engine and the sink.
    pub fn finish(mut self) -> Result<(E, W), ReplayError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok((self.inner, self.writer.into_inner()))
    }
}

impl<E: SimulationEngine + StateDigest, W: Write> RecordingEngine<E, W> {
    /// Like [`new()`](RecordingEngine::new), additionally storing the
    /// engine's state digest after every step when the policy allows it.
    pub fn with_digests(
        inner: E,
        sink: W,
        settings: &SessionSettings,
        long_tics: bool,
        policy: &DemoPolicy,
    ) -> Result<Self, ReplayError> {
        Self::start(inner, sink, settings, long_tics, Some(E::digest), policy)
    }
}

impl<E: SimulationEngine, W: Write> SimulationEngine for RecordingEngine<E, W> {
    fn sample_input(&mut self) {
        self.inner.sample_input();
    }

    fn advance_menu(&mut self) {
        self.inner.advance_menu();
    }

    fn fill_command(&mut self, cmd: &mut TicCmd, tic: TicIndex) {
        self.inner.fill_command(cmd, tic);
    }

    fn step_simulation(
        &mut self,
        commands: &[TicCmd; MAX_PARTICIPANTS],
        present: &[bool; MAX_PARTICIPANTS],
    ) {
        let long_tics = self.header().flags.contains(DemoFlags::LONG_TICS);
        let set = quantize_set(
            &TicSet {
                commands: *commands,
                present: *present,
            },
            long_tics,
        );
        self.inner.step_simulation(&set.commands, &set.present);

        if self.error.is_none() {
            let frame = DemoFrame {
                tic: self.next_tic,
                set,
                digest: self.digest.map(|digest| digest(&self.inner)),
            };
            if let Err(e) = self.writer.write_frame(&frame) {
                warn!("demo recording stopped at tic {}: {e}", self.next_tic);
                self.error = Some(e);
            }
        }
        self.next_tic += 1;
    }
}

impl<E: StateDigest, W: Write> StateDigest for RecordingEngine<E, W> {
    fn digest(&self) -> u64 {
        self.inner.digest()
    }
}
