//! Criterion benchmarks for whole scheduler frames.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use ticloop_bench::{reference_profile, remote_script, stress_profile, BenchProfile};
use ticloop_engine::{LockstepScheduler, SchedulerConfig, SessionSettings};
use ticloop_test_utils::fixtures::ChaChaInputEngine;
use ticloop_test_utils::{ManualClock, ScriptedTransport};

const FRAMES: u64 = 1000;

type Sched = LockstepScheduler<ChaChaInputEngine, ScriptedTransport, ManualClock>;

/// A scheduler with `FRAMES` tics of remote input already delivered.
fn networked(profile: &BenchProfile) -> (Sched, ManualClock) {
    let clock = ManualClock::new();
    let mut transport = ScriptedTransport::networked().with_clock(clock.clone());
    for batch in remote_script(&profile.settings, FRAMES, 42) {
        transport.queue_batch(batch);
    }
    let mut sched = LockstepScheduler::new(
        ChaChaInputEngine::new(42),
        transport,
        clock.clone(),
        &profile.settings,
        profile.config.clone(),
    )
    .unwrap();
    sched.start_loop();
    (sched, clock)
}

fn run_frames(profile: &BenchProfile, (mut sched, clock): (Sched, ManualClock)) {
    let ticdup = u64::from(profile.settings.ticdup);
    for k in 1..=FRAMES {
        clock.set_tic(k * ticdup);
        black_box(sched.try_run_tics());
    }
}

fn bench_local_frames(c: &mut Criterion) {
    let settings = SessionSettings::default();
    c.bench_function("local_1000_frames", |b| {
        b.iter_batched(
            || {
                let clock = ManualClock::new();
                let mut sched = LockstepScheduler::new(
                    ChaChaInputEngine::new(42),
                    ScriptedTransport::local(),
                    clock.clone(),
                    &settings,
                    SchedulerConfig::default(),
                )
                .unwrap();
                sched.start_loop();
                (sched, clock)
            },
            |(mut sched, clock)| {
                for k in 1..=FRAMES {
                    clock.set_tic(k);
                    black_box(sched.try_run_tics());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_reference_frames(c: &mut Criterion) {
    let profile = reference_profile();
    c.bench_function("reference_1000_frames", |b| {
        b.iter_batched(
            || networked(&profile),
            |state| run_frames(&profile, state),
            BatchSize::LargeInput,
        );
    });
}

fn bench_stress_frames(c: &mut Criterion) {
    let profile = stress_profile();
    c.bench_function("stress_1000_frames", |b| {
        b.iter_batched(
            || networked(&profile),
            |state| run_frames(&profile, state),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_local_frames,
    bench_reference_frames,
    bench_stress_frames
);
criterion_main!(benches);
