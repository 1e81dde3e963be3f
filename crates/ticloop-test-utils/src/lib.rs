//! Test doubles for ticloop development.
//!
//! Provides deterministic stand-ins for the scheduler's collaborators:
//! clocks that only move when told to ([`ManualClock`], [`SteppingClock`]),
//! a recording [`MockEngine`], a [`ScriptedTransport`] whose deliveries
//! are queued up front, and a seeded [`ChaChaInputEngine`] for
//! determinism and replay tests.
//!
//! A frame that has to wait for input only returns once the clock has
//! moved past the stall guard. With a [`ManualClock`] nothing moves it
//! during the wait unless the transport does, so tests that can wait
//! should attach the clock to the transport with
//! [`ScriptedTransport::with_clock`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ticloop_core::{
    Delivery, OutboundPacket, RemoteBatch, SimulationEngine, TicCmd, TicIndex, TimeSource,
    Transport, MAX_PARTICIPANTS,
};

pub use fixtures::ChaChaInputEngine;

/// The smallest millisecond reading at which the 35 Hz clock reads `tic`.
pub fn ms_for_tic(tic: u64) -> u64 {
    (tic * 1000 + 34) / 35
}

// ── Clocks ─────────────────────────────────────────────────────────

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle while the
/// scheduler owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock reading exactly the start of `tic`.
    pub fn at_tic(tic: u64) -> Self {
        let clock = Self::new();
        clock.set_tic(tic);
        clock
    }

    pub fn now(&self) -> u64 {
        self.ms.load(Ordering::Acquire)
    }

    pub fn set_ms(&self, ms: u64) {
        self.ms.store(ms, Ordering::Release);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.ms.fetch_add(ms, Ordering::AcqRel);
    }

    /// Jump to the first millisecond of `tic`.
    pub fn set_tic(&self, tic: u64) {
        self.set_ms(ms_for_tic(tic));
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&mut self) -> u64 {
        self.now()
    }
}

/// A clock that reads tic 0, 1, 2, ... on successive reads.
#[derive(Clone, Debug, Default)]
pub struct SteppingClock {
    next: u64,
    reads: u64,
}

impl SteppingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the clock has been read.
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl TimeSource for SteppingClock {
    fn now_ms(&mut self) -> u64 {
        let ms = ms_for_tic(self.next);
        self.next += 1;
        self.reads += 1;
        ms
    }
}

// ── MockEngine ─────────────────────────────────────────────────────

/// One recorded `step_simulation` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepRecord {
    pub commands: [TicCmd; MAX_PARTICIPANTS],
    pub present: [bool; MAX_PARTICIPANTS],
}

/// Engine double that records every call.
///
/// `fill_command` copies a template command and stamps `consistency`
/// with the low 16 bits of the tic index, so tests can tell which
/// tic a command was built for.
#[derive(Clone, Debug, Default)]
pub struct MockEngine {
    template: TicCmd,
    sample_calls: u64,
    menu_calls: u64,
    filled: Vec<TicIndex>,
    steps: Vec<StepRecord>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `cmd` as the template for every filled command.
    pub fn set_template(&mut self, cmd: TicCmd) {
        self.template = cmd;
    }

    pub fn set_forward_move(&mut self, forward_move: i8) {
        self.template.forward_move = forward_move;
    }

    pub fn sample_calls(&self) -> u64 {
        self.sample_calls
    }

    pub fn menu_calls(&self) -> u64 {
        self.menu_calls
    }

    /// Tics passed to `fill_command`, in call order.
    pub fn filled_tics(&self) -> &[TicIndex] {
        &self.filled
    }

    /// Every `step_simulation` call, in order.
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }
}

impl SimulationEngine for MockEngine {
    fn sample_input(&mut self) {
        self.sample_calls += 1;
    }

    fn advance_menu(&mut self) {
        self.menu_calls += 1;
    }

    fn fill_command(&mut self, cmd: &mut TicCmd, tic: TicIndex) {
        *cmd = self.template;
        cmd.consistency = tic.0 as u16;
        self.filled.push(tic);
    }

    fn step_simulation(
        &mut self,
        commands: &[TicCmd; MAX_PARTICIPANTS],
        present: &[bool; MAX_PARTICIPANTS],
    ) {
        self.steps.push(StepRecord {
            commands: *commands,
            present: *present,
        });
    }
}

// ── ScriptedTransport ──────────────────────────────────────────────

/// Transport double with pre-queued deliveries.
///
/// Deliveries queued with [`queue`](Self::queue) are returned by both
/// `try_recv` and `recv_timeout`. Deliveries queued with
/// [`queue_on_wait`](Self::queue_on_wait) only arrive from
/// `recv_timeout`, i.e. once the scheduler has started waiting. Every
/// `recv_timeout` call advances the attached [`ManualClock`], if any, by
/// the requested timeout.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    networked: bool,
    ready: VecDeque<Delivery>,
    on_wait: VecDeque<Delivery>,
    sent: Vec<OutboundPacket>,
    waits: u64,
    clock: Option<ManualClock>,
}

impl ScriptedTransport {
    /// A transport that reports itself as networked.
    pub fn networked() -> Self {
        Self {
            networked: true,
            ..Self::default()
        }
    }

    /// A transport with no remote peers.
    pub fn local() -> Self {
        Self::default()
    }

    /// Advance `clock` by the timeout on every `recv_timeout`.
    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn queue(&mut self, delivery: Delivery) {
        self.ready.push_back(delivery);
    }

    pub fn queue_batch(&mut self, batch: RemoteBatch) {
        self.queue(Delivery::Batch(batch));
    }

    pub fn queue_on_wait(&mut self, delivery: Delivery) {
        self.on_wait.push_back(delivery);
    }

    /// Packets the scheduler has sent, in order.
    pub fn sent(&self) -> &[OutboundPacket] {
        &self.sent
    }

    /// Number of `recv_timeout` calls.
    pub fn waits(&self) -> u64 {
        self.waits
    }

    /// Deliveries not yet taken.
    pub fn pending(&self) -> usize {
        self.ready.len() + self.on_wait.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, packet: OutboundPacket) {
        self.sent.push(packet);
    }

    fn try_recv(&mut self) -> Option<Delivery> {
        self.ready.pop_front()
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Option<Delivery> {
        self.waits += 1;
        if let Some(clock) = &self.clock {
            clock.advance_ms(timeout.as_millis() as u64);
        }
        self.ready.pop_front().or_else(|| self.on_wait.pop_front())
    }

    fn is_networked(&self) -> bool {
        self.networked
    }
}
