//! Ticloop Quickstart - a single-player session driven by a real clock.
//!
//! Demonstrates:
//!   1. Implementing a `SimulationEngine` (input sampling, command
//!      building, one deterministic step per tic)
//!   2. Building `SessionSettings` and a `SchedulerConfig`
//!   3. Running a frame loop with `try_run_tics()` at a render rate that
//!      is not a multiple of 35 Hz
//!   4. Reading per-frame and cumulative metrics
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example quickstart

use std::thread;
use std::time::{Duration, Instant};

use ticloop_core::{Buttons, SimulationEngine, TicCmd, TicIndex, MAX_PARTICIPANTS};
use ticloop_engine::{
    FrameOutcome, LocalTransport, LockstepScheduler, MonotonicClock, SchedulerConfig,
    SessionSettings,
};

// ─── Frame loop parameters ──────────────────────────────────────

/// Roughly 60 rendered frames per second.
const FRAME_TIME: Duration = Duration::from_micros(16_667);
const RUN_FOR: Duration = Duration::from_secs(2);

// ─── Engine: a walker that turns every 16 tics ──────────────────

#[derive(Default)]
struct Walker {
    x: i64,
    y: i64,
    heading: u8,
    steps: u64,
    input_polls: u64,
}

impl SimulationEngine for Walker {
    fn sample_input(&mut self) {
        self.input_polls += 1;
    }

    fn advance_menu(&mut self) {}

    fn fill_command(&mut self, cmd: &mut TicCmd, tic: TicIndex) {
        cmd.forward_move = 25;
        if tic.0 % 16 == 15 {
            cmd.angle_turn = 0x4000;
        }
        if tic.0 % 35 == 0 {
            cmd.buttons = Buttons::ATTACK;
        }
    }

    fn step_simulation(
        &mut self,
        commands: &[TicCmd; MAX_PARTICIPANTS],
        present: &[bool; MAX_PARTICIPANTS],
    ) {
        if !present[0] {
            return;
        }
        let cmd = commands[0];
        if cmd.angle_turn != 0 {
            self.heading = (self.heading + 1) % 4;
        }
        let d = i64::from(cmd.forward_move);
        match self.heading {
            0 => self.x += d,
            1 => self.y += d,
            2 => self.x -= d,
            _ => self.y -= d,
        }
        self.steps += 1;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let settings = SessionSettings::default();
    let config = SchedulerConfig::default();
    let mut sched = LockstepScheduler::new(
        Walker::default(),
        LocalTransport,
        MonotonicClock::new(),
        &settings,
        config,
    )?;

    println!("Running a local session for {RUN_FOR:?} at ~60 fps...");
    let started = Instant::now();
    sched.start_loop();

    let mut catch_up_frames = 0u32;
    while started.elapsed() < RUN_FOR {
        let report = sched.try_run_tics();
        match report.outcome {
            FrameOutcome::Ran { tics } if tics > 1 => catch_up_frames += 1,
            FrameOutcome::SessionEnded => break,
            _ => {}
        }
        thread::sleep(FRAME_TIME);
    }

    let walker = sched.engine();
    let metrics = sched.metrics();
    println!();
    println!("frames rendered:    {}", metrics.frames);
    println!("tics simulated:     {}", metrics.tics_run);
    println!("catch-up frames:    {catch_up_frames}");
    println!("pacing refusals:    {}", metrics.pacing_refusals);
    println!("input polls:        {}", walker.input_polls);
    println!("walker position:    ({}, {})", walker.x, walker.y);
    println!(
        "expected tics:      ~{}",
        RUN_FOR.as_millis() as i64 * ticloop_core::TICRATE / 1000
    );
    assert_eq!(walker.steps, metrics.tics_run);
    Ok(())
}
