//! The lockstep scheduler.
//!
//! [`LockstepScheduler`] is the primary user-facing API. The host's frame
//! loop calls [`try_run_tics()`](LockstepScheduler::try_run_tics) once per
//! rendered frame; each call produces local commands for the wall-clock
//! time that has passed, exchanges commands with the transport, decides
//! how many complete tics to run, waits (bounded) for missing input, and
//! then steps the simulation once per tic in ring order.
//!
//! # Ownership model
//!
//! The scheduler owns the engine, the transport, the clock, and the
//! [`SessionContext`] (cursors and command ring). Everything runs on the
//! caller's thread. A transport that lives on another thread only hands
//! over deliveries, which the scheduler applies to the ring itself, so
//! the ring needs no locking.
//!
//! # Blocking
//!
//! The only blocking point is the wait for missing input, and it is
//! bounded twice: each block on the transport lasts at most
//! [`wait_slice_ms`](SchedulerConfig::wait_slice_ms), and the whole wait
//! gives up once [`stall_guard_tics`](SchedulerConfig::stall_guard_tics)
//! real tics have passed since the frame began.

use std::time::{Duration, Instant};

use log::{debug, trace};
use smallvec::SmallVec;
use ticloop_core::{
    Delivery, OutboundPacket, RemoteBatch, SimulationEngine, TicCmd, TicIndex, TimeSource,
    Transport,
};

use crate::clock::TicClock;
use crate::config::{ConfigError, SchedulerConfig, SessionSettings, SyncMode};
use crate::drift::DriftCorrector;
use crate::intake::receive_batch;
use crate::metrics::{FrameMetrics, SchedulerMetrics};
use crate::producer::produce_one_tic;
use crate::pump::PacingPump;
use crate::session::SessionContext;

// ── FrameReport ─────────────────────────────────────────────────

/// How a frame ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame ran `tics` complete tics.
    Ran {
        /// Tics run (each one `ticdup` simulation steps).
        tics: u64,
    },
    /// Input did not arrive within the stall guard. Nothing was run; the
    /// host should render and try again next frame.
    Stalled,
    /// No participant is left in the game. Tics run before the session
    /// ended are counted in the frame metrics.
    SessionEnded,
}

/// Result of one [`LockstepScheduler::try_run_tics()`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// How the frame ended.
    pub outcome: FrameOutcome,
    /// What happened during the frame.
    pub metrics: FrameMetrics,
}

/// How many tics a frame should run.
///
/// Fixed-availability runs everything available. Adaptive follows real
/// elapsed time, running one extra tic when more than one is buffered
/// beyond it, and never more than are available. Both run at least one,
/// waiting for it if necessary.
pub fn frame_tic_count(mode: SyncMode, real_tics: i64, available: u64) -> u64 {
    let available = available as i64;
    let count = match mode {
        SyncMode::FixedAvailability => available,
        SyncMode::Adaptive => {
            if real_tics < available - 1 {
                real_tics + 1
            } else if real_tics < available {
                real_tics
            } else {
                available
            }
        }
    };
    count.max(1) as u64
}

// ── LockstepScheduler ───────────────────────────────────────────

/// Single-threaded lockstep tic scheduler.
///
/// Created with [`new()`](LockstepScheduler::new), which validates the
/// configuration and bootstraps the session. Call
/// [`start_loop()`](LockstepScheduler::start_loop) right before the first
/// frame so the pacing clock does not count setup time as elapsed.
///
/// # Example
///
/// ```
/// use ticloop_core::{SimulationEngine, TicCmd, TicIndex, TimeSource, MAX_PARTICIPANTS};
/// use ticloop_engine::{LocalTransport, LockstepScheduler, SchedulerConfig, SessionSettings};
///
/// struct Counter(u64);
/// impl SimulationEngine for Counter {
///     fn sample_input(&mut self) {}
///     fn advance_menu(&mut self) {}
///     fn fill_command(&mut self, cmd: &mut TicCmd, _tic: TicIndex) {
///         cmd.forward_move = 1;
///     }
///     fn step_simulation(
///         &mut self,
///         commands: &[TicCmd; MAX_PARTICIPANTS],
///         _present: &[bool; MAX_PARTICIPANTS],
///     ) {
///         self.0 += commands[0].forward_move as u64;
///     }
/// }
///
/// // One tic of wall-clock time passes between reads.
/// struct Ticker(u64);
/// impl TimeSource for Ticker {
///     fn now_ms(&mut self) -> u64 {
///         self.0 += 29;
///         self.0
///     }
/// }
///
/// let mut sched = LockstepScheduler::new(
///     Counter(0),
///     LocalTransport,
///     Ticker(0),
///     &SessionSettings::default(),
///     SchedulerConfig::default(),
/// )?;
/// sched.start_loop();
/// for _ in 0..10 {
///     sched.try_run_tics();
/// }
/// assert!(sched.engine().0 > 0);
/// # Ok::<(), ticloop_engine::ConfigError>(())
/// ```
pub struct LockstepScheduler<E, T, C> {
    engine: E,
    transport: T,
    clock: TicClock<C>,
    session: SessionContext,
    pump: PacingPump,
    drift: DriftCorrector,
    config: SchedulerConfig,
    previous_sample: i64,
    frame_produced: u64,
    metrics: SchedulerMetrics,
}

impl<E, T, C> LockstepScheduler<E, T, C>
where
    E: SimulationEngine,
    T: Transport,
    C: TimeSource,
{
    /// Validate the configuration and bootstrap a session.
    ///
    /// The clock-skew offset starts at zero and every cursor at tic 0.
    pub fn new(
        engine: E,
        transport: T,
        clock: C,
        settings: &SessionSettings,
        config: SchedulerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let session =
            SessionContext::bootstrap(settings, config.ring_capacity, transport.is_networked())?;
        Ok(Self {
            engine,
            transport,
            clock: TicClock::new(clock, settings.sync_mode),
            session,
            pump: PacingPump::default(),
            drift: DriftCorrector::new(),
            config,
            previous_sample: 0,
            frame_produced: 0,
            metrics: SchedulerMetrics::default(),
        })
    }

    fn now_tics(&mut self) -> i64 {
        self.clock
            .adjusted_tics()
            .div_euclid(self.session.params.ticdup as i64)
    }

    /// Sample the clock as the starting point for pacing.
    pub fn start_loop(&mut self) {
        let now = self.now_tics();
        self.pump.resync(now);
        self.previous_sample = now;
        debug!("game loop started at tic {now}");
    }

    /// End the session. The next frame reports
    /// [`FrameOutcome::SessionEnded`].
    pub fn quit(&mut self) {
        self.session.quit();
    }

    // ── Frame ───────────────────────────────────────────────────

    /// Run one frame: produce, exchange, decide, wait, execute.
    pub fn try_run_tics(&mut self) -> FrameReport {
        let started = Instant::now();
        let mut frame = FrameMetrics::default();
        self.frame_produced = 0;

        let enter_real = self.clock.adjusted_tics();
        let enter_tic = enter_real.div_euclid(self.session.params.ticdup as i64);
        frame.real_tics = enter_tic - self.previous_sample;
        self.previous_sample = enter_tic;

        if self.config.single_tics {
            self.produce_one_tic();
            self.flush_outbound();
        } else {
            self.net_update();
        }

        let available = self.session.available();
        let count = self.decide_count(frame.real_tics, available);
        frame.available = available;
        frame.count = count;

        let outcome = match self.wait_for_tics(count, enter_real, &mut frame) {
            Ok(()) => self.execute(count, &mut frame),
            Err(outcome) => outcome,
        };

        frame.produced = self.frame_produced;
        frame.steps_run = frame.tics_run * self.session.params.ticdup;
        frame.total_us = started.elapsed().as_micros() as u64;

        self.metrics.frames += 1;
        self.metrics.tics_run += frame.tics_run;
        if outcome == FrameOutcome::Stalled {
            self.metrics.stalls += 1;
        }

        FrameReport {
            outcome,
            metrics: frame,
        }
    }

    fn decide_count(&mut self, real_tics: i64, available: u64) -> u64 {
        let mode = self.session.params.sync_mode;
        if mode == SyncMode::Adaptive && self.session.connected {
            self.correct_drift();
        }
        frame_tic_count(mode, real_tics, available)
    }

    fn correct_drift(&mut self) {
        let adjustment = self.drift.update(&self.session, &mut self.pump);
        if adjustment.rewound {
            self.metrics.drift_rewinds += 1;
        }
        if adjustment.skipped {
            self.metrics.drift_skips += 1;
        }
    }

    fn wait_for_tics(
        &mut self,
        count: u64,
        enter_real: i64,
        frame: &mut FrameMetrics,
    ) -> Result<(), FrameOutcome> {
        let needed = self.session.simulated_tic().0 + count;
        loop {
            if !self.session.players_in_game() {
                return Err(FrameOutcome::SessionEnded);
            }
            if self.session.low_tic().0 >= needed {
                return Ok(());
            }

            self.net_update();
            if self.session.low_tic().0 >= needed {
                continue;
            }

            // Real tics, not ticdup groups.
            let waited = self.clock.adjusted_tics() - enter_real;
            if waited >= self.config.stall_guard_tics as i64 {
                debug!(
                    "stalled waiting for tic {} (low tic {}, waited {waited} tics)",
                    needed - 1,
                    self.session.low_tic()
                );
                return Err(FrameOutcome::Stalled);
            }

            frame.wait_polls += 1;
            self.wait_slice();
        }
    }

    /// Block on the transport for one wait slice.
    fn wait_slice(&mut self) {
        let slice = Duration::from_millis(self.config.wait_slice_ms);
        if self.session.intake_has_room() {
            if let Some(delivery) = self.transport.recv_timeout(slice) {
                self.apply_delivery(delivery);
            }
        } else {
            std::thread::sleep(slice);
        }
    }

    fn execute(&mut self, count: u64, frame: &mut FrameMetrics) -> FrameOutcome {
        if count > 1 {
            debug!("catching up {count} tics");
        }
        for _ in 0..count {
            if !self.session.players_in_game() {
                return FrameOutcome::SessionEnded;
            }
            self.run_tic();
            frame.tics_run += 1;
            self.net_update();
        }
        FrameOutcome::Ran {
            tics: frame.tics_run,
        }
    }

    /// Run every duplicated step of the slot the simulation is on.
    fn run_tic(&mut self) {
        let tic = self.session.simulated_tic();
        debug_assert!(
            tic < self.session.low_tic(),
            "running tic {tic} beyond low tic {}",
            self.session.low_tic()
        );

        let session = &mut self.session;
        let set = session.ring.slot_mut(tic);
        if !session.connected {
            set.clear_non_local(session.params.local);
        }
        for _ in 0..session.params.ticdup {
            session.active = set.present;
            self.engine.step_simulation(&set.commands, &set.present);
            session.cursors.simulated += 1;
            set.squash_duplicates();
        }
        trace!("ran tic {tic}");
    }

    // ── Production and exchange ─────────────────────────────────

    /// Produce one local tic directly, bypassing the pacing pump.
    pub fn produce_one_tic(&mut self) -> bool {
        let produced = produce_one_tic(&mut self.session, &mut self.engine);
        if produced {
            self.frame_produced += 1;
        }
        produced
    }

    /// Store a remote batch, or handle a disconnect notice (`None`).
    ///
    /// Returns `false` if the batch was refused because the ring has no
    /// free slot: every slot holds a tic the simulation has not run yet.
    /// The transport poll only takes batches while there is room, so this
    /// can only happen to callers feeding intake directly.
    pub fn receive_batch(&mut self, batch: Option<&RemoteBatch>) -> bool {
        let accepted = receive_batch(&mut self.session, batch);
        match batch {
            Some(_) if accepted => self.metrics.batches_received += 1,
            Some(_) => {}
            None => self.metrics.disconnects += 1,
        }
        accepted
    }

    /// Drain the transport, pump local production, and flush outbound
    /// commands. Does nothing in single-tic mode.
    pub fn net_update(&mut self) {
        if self.config.single_tics {
            return;
        }
        self.poll_transport();

        let outcome = self
            .pump
            .pump(&mut self.clock, &mut self.session, &mut self.engine);
        self.frame_produced += outcome.produced;
        if outcome.refused() {
            self.metrics.pacing_refusals += 1;
        }

        self.flush_outbound();
    }

    fn poll_transport(&mut self) {
        while self.session.intake_has_room() {
            match self.transport.try_recv() {
                Some(delivery) => self.apply_delivery(delivery),
                None => break,
            }
        }
    }

    fn apply_delivery(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Batch(batch) => {
                self.receive_batch(Some(&batch));
            }
            Delivery::Disconnected => {
                self.receive_batch(None);
            }
            Delivery::ClockOffset(offset) => {
                debug!("clock offset adjusted to {offset} ms");
                self.clock.set_offset(offset);
                self.metrics.clock_adjustments += 1;
            }
        }
    }

    /// Offer unsent local tics to the transport, repeating up to
    /// `extra_tics` already-sent tics in front of them.
    fn flush_outbound(&mut self) {
        let session = &mut self.session;
        if !session.connected || session.params.drone {
            return;
        }
        let produced = session.cursors.produced;
        let sent = session.cursors.sent;
        if sent >= produced {
            return;
        }

        let mut start = TicIndex(sent.0.saturating_sub(session.params.extra_tics as u64));
        while start < sent && session.ring.get(start).is_none() {
            start = start.next();
        }
        let local = session.params.local.index();
        let commands: SmallVec<[TicCmd; 4]> = (start.0..produced.0)
            .filter_map(|t| session.ring.get(TicIndex(t)))
            .map(|set| set.commands[local])
            .collect();

        self.transport.send(OutboundPacket {
            from: session.params.local,
            start,
            commands,
        });
        session.cursors.sent = produced;
        self.metrics.packets_sent += 1;
    }

    // ── Accessors ───────────────────────────────────────────────

    /// The session: parameters, cursors, ring, presence.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The simulation engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the simulation engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The tic clock.
    pub fn clock(&self) -> &TicClock<C> {
        &self.clock
    }

    /// Mutable access to the tic clock.
    pub fn clock_mut(&mut self) -> &mut TicClock<C> {
        &mut self.clock
    }

    /// The pacing pump.
    pub fn pump(&self) -> &PacingPump {
        &self.pump
    }

    /// The configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Counters accumulated since construction.
    pub fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    /// Take the collaborators back.
    pub fn into_parts(self) -> (E, T, C) {
        (self.engine, self.transport, self.clock.into_source())
    }
}

impl<E, T, C> std::fmt::Debug for LockstepScheduler<E, T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockstepScheduler")
            .field("cursors", &self.session.cursors)
            .field("connected", &self.session.connected)
            .field("skip", &self.pump.skip())
            .field("config", &self.config)
            .finish()
    }
}
