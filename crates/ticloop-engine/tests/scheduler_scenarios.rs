//! End-to-end frame scenarios for the lockstep scheduler.
//!
//! Every test drives [`LockstepScheduler::try_run_tics`] against test
//! doubles: a [`ManualClock`] (or [`SteppingClock`]) for time, a
//! [`MockEngine`] that records each step, and a [`ScriptedTransport`]
//! with deliveries queued up front. Networked tests attach the clock to
//! the transport so that waiting lets time pass.

use ticloop_core::{Buttons, Delivery, Fixed, ParticipantId, RemoteBatch, TicCmd, TicIndex};
use ticloop_engine::{
    FrameOutcome, LockstepScheduler, SchedulerConfig, SessionSettings, SyncMode,
};
use ticloop_test_utils::{ManualClock, MockEngine, ScriptedTransport, SteppingClock};

type Sched<C> = LockstepScheduler<MockEngine, ScriptedTransport, C>;

fn local_settings() -> SessionSettings {
    SessionSettings::default()
}

fn two_player_settings() -> SessionSettings {
    SessionSettings {
        participants: 2,
        local: ParticipantId(0),
        ..SessionSettings::default()
    }
}

fn remote_cmd(forward_move: i8) -> TicCmd {
    TicCmd {
        forward_move,
        ..TicCmd::default()
    }
}

fn batch_for(participant: u8, forward_move: i8) -> RemoteBatch {
    RemoteBatch::empty().with(ParticipantId(participant), remote_cmd(forward_move))
}

fn networked(
    settings: &SessionSettings,
    config: SchedulerConfig,
) -> (Sched<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let transport = ScriptedTransport::networked().with_clock(clock.clone());
    let sched =
        LockstepScheduler::new(MockEngine::new(), transport, clock.clone(), settings, config)
            .unwrap();
    (sched, clock)
}

fn local(settings: &SessionSettings) -> (Sched<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let sched = LockstepScheduler::new(
        MockEngine::new(),
        ScriptedTransport::local(),
        clock.clone(),
        settings,
        SchedulerConfig::default(),
    )
    .unwrap();
    (sched, clock)
}

// ── Local sessions ─────────────────────────────────────────────────

#[test]
fn first_frame_produces_and_runs_tic_zero() {
    let mut sched = LockstepScheduler::new(
        MockEngine::new(),
        ScriptedTransport::local(),
        SteppingClock::new(),
        &local_settings(),
        SchedulerConfig::default(),
    )
    .unwrap();

    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 1 });
    assert_eq!(report.metrics.count, 1);
    assert_eq!(report.metrics.tics_run, 1);
    assert_eq!(sched.engine().filled_tics()[0], TicIndex(0));

    let steps = sched.engine().steps();
    assert_eq!(steps.len(), 1);
    assert!(steps[0].present[0]);
    assert_eq!(steps[0].commands[0].consistency, 0);
}

#[test]
fn one_tic_per_frame_when_frames_track_the_clock() {
    let (mut sched, clock) = local(&local_settings());
    sched.start_loop();

    for k in 1..=10u64 {
        clock.set_tic(k);
        let report = sched.try_run_tics();
        assert_eq!(report.outcome, FrameOutcome::Ran { tics: 1 }, "frame {k}");
        assert_eq!(report.metrics.real_tics, 1);
        assert_eq!(sched.session().cursors().simulated, k);
    }

    // Each step consumed the slot built for it, in order.
    let order: Vec<u16> = sched
        .engine()
        .steps()
        .iter()
        .map(|s| s.commands[0].consistency)
        .collect();
    assert_eq!(order, (0..10).collect::<Vec<u16>>());
    assert_eq!(sched.metrics().frames, 10);
    assert_eq!(sched.metrics().tics_run, 10);
}

#[test]
fn ticdup_repeats_each_command_and_squashes_chat() {
    let settings = SessionSettings {
        ticdup: 3,
        ..local_settings()
    };
    let (mut sched, clock) = local(&settings);
    sched.engine_mut().set_template(TicCmd {
        forward_move: 5,
        chat_char: b'x',
        buttons: Buttons::SPECIAL | 0x04,
        ..TicCmd::default()
    });
    sched.start_loop();

    clock.set_tic(3);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 1 });
    assert_eq!(report.metrics.steps_run, 3);
    assert_eq!(sched.session().cursors().simulated, 3);
    assert_eq!(sched.engine().filled_tics(), &[TicIndex(0)]);

    let steps = sched.engine().steps();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].commands[0].chat_char, b'x');
    assert_eq!(steps[0].commands[0].buttons, Buttons::SPECIAL | 0x04);
    for step in &steps[1..] {
        assert_eq!(step.commands[0].chat_char, 0);
        assert_eq!(step.commands[0].buttons, 0);
        assert_eq!(step.commands[0].forward_move, 5);
    }
}

#[test]
fn ticdup_keeps_ordinary_buttons_on_repeats() {
    let settings = SessionSettings {
        ticdup: 2,
        ..local_settings()
    };
    let (mut sched, clock) = local(&settings);
    sched.engine_mut().set_template(TicCmd {
        buttons: Buttons::ATTACK,
        ..TicCmd::default()
    });
    sched.start_loop();

    clock.set_tic(2);
    sched.try_run_tics();

    let steps = sched.engine().steps();
    assert_eq!(steps.len(), 2);
    assert!(steps.iter().all(|s| s.commands[0].buttons == Buttons::ATTACK));
}

#[test]
fn quit_ends_the_session() {
    let (mut sched, clock) = local(&local_settings());
    sched.start_loop();
    clock.set_tic(1);
    sched.quit();

    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::SessionEnded);
    assert!(sched.engine().steps().is_empty());
    assert!(sched.session().is_finished());
}

#[test]
fn clock_offset_delivery_moves_the_pacing_clock() {
    let (mut sched, clock) = local(&local_settings());
    sched
        .transport_mut()
        .queue(Delivery::ClockOffset(Fixed::from_int(1000)));
    sched.start_loop();

    clock.set_tic(1);
    let report = sched.try_run_tics();

    assert_eq!(sched.clock().offset(), Fixed::from_int(1000));
    assert_eq!(sched.metrics().clock_adjustments, 1);
    // A second of skew is far more than pacing lets the producer use.
    assert!(sched.metrics().pacing_refusals >= 1);
    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 3 });
}

#[test]
fn single_tics_mode_produces_one_command_per_frame() {
    let clock = ManualClock::new();
    let config = SchedulerConfig {
        single_tics: true,
        ..SchedulerConfig::default()
    };
    let mut sched = LockstepScheduler::new(
        MockEngine::new(),
        ScriptedTransport::local(),
        clock.clone(),
        &local_settings(),
        config,
    )
    .unwrap();
    sched.start_loop();

    // Five tics of wall-clock time pass, but only one is produced.
    clock.set_tic(5);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 1 });
    assert_eq!(report.metrics.produced, 1);
    assert_eq!(sched.engine().filled_tics(), &[TicIndex(0)]);
}

// ── Networked sessions ─────────────────────────────────────────────

#[test]
fn remote_commands_are_merged_into_the_step() {
    let (mut sched, clock) = networked(&two_player_settings(), SchedulerConfig::default());
    sched.transport_mut().queue_batch(batch_for(1, 7));
    sched.start_loop();

    clock.set_tic(1);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 1 });
    let step = &sched.engine().steps()[0];
    assert!(step.present[0]);
    assert!(step.present[1]);
    assert!(!step.present[2]);
    assert_eq!(step.commands[1].forward_move, 7);
    assert_eq!(sched.metrics().batches_received, 1);
}

#[test]
fn frame_waits_for_late_remote_tic() {
    let (mut sched, clock) = networked(&two_player_settings(), SchedulerConfig::default());
    sched
        .transport_mut()
        .queue_on_wait(Delivery::Batch(batch_for(1, 3)));
    sched.start_loop();

    clock.set_tic(1);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 1 });
    assert_eq!(report.metrics.wait_polls, 1);
    assert_eq!(sched.transport().waits(), 1);
    assert_eq!(sched.engine().steps()[0].commands[1].forward_move, 3);

    // The local command went out before the wait.
    let sent = sched.transport().sent();
    assert_eq!(sent[0].start, TicIndex(0));
    assert_eq!(sent[0].from, ParticipantId(0));
}

#[test]
fn missing_remote_input_stalls_the_frame() {
    let (mut sched, clock) = networked(&two_player_settings(), SchedulerConfig::default());
    sched.start_loop();

    clock.set_tic(1);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Stalled);
    assert_eq!(report.metrics.tics_run, 0);
    assert!(report.metrics.wait_polls > 0);
    assert!(sched.engine().steps().is_empty());
    assert_eq!(sched.metrics().stalls, 1);
    // The guard is measured from frame entry.
    assert!(clock.now() >= ticloop_test_utils::ms_for_tic(1 + 5));
    // Pacing kept production bounded while waiting.
    assert!(sched.session().ahead_by() <= 8);
}

#[test]
fn stall_guard_is_configurable() {
    let config = SchedulerConfig {
        stall_guard_tics: 2,
        ..SchedulerConfig::default()
    };
    let (mut sched, clock) = networked(&two_player_settings(), config);
    sched.start_loop();

    clock.set_tic(1);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Stalled);
    assert!(clock.now() >= ticloop_test_utils::ms_for_tic(3));
    assert!(clock.now() < ticloop_test_utils::ms_for_tic(4));
}

#[test]
fn stall_guard_counts_real_tics_under_ticdup() {
    let settings = SessionSettings {
        ticdup: 3,
        ..two_player_settings()
    };
    let (mut sched, clock) = networked(&settings, SchedulerConfig::default());
    sched.start_loop();

    clock.set_tic(3);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Stalled);
    // Five real tics past entry, not five groups of three.
    assert!(clock.now() >= ticloop_test_utils::ms_for_tic(3 + 5));
    assert!(clock.now() < ticloop_test_utils::ms_for_tic(3 + 6));
}

#[test]
fn frame_entry_mid_session_is_measured_from_the_clock() {
    let clock = ManualClock::at_tic(100);
    let transport = ScriptedTransport::networked().with_clock(clock.clone());
    let mut sched = LockstepScheduler::new(
        MockEngine::new(),
        transport,
        clock.clone(),
        &two_player_settings(),
        SchedulerConfig::default(),
    )
    .unwrap();
    sched.start_loop();

    clock.set_tic(101);
    let report = sched.try_run_tics();

    assert_eq!(report.metrics.real_tics, 1);
    assert_eq!(report.outcome, FrameOutcome::Stalled);
    assert!(clock.now() >= ticloop_test_utils::ms_for_tic(101 + 5));
    assert!(clock.now() < ticloop_test_utils::ms_for_tic(101 + 6));
}

#[test]
fn stalled_session_resumes_when_input_arrives() {
    let (mut sched, clock) = networked(&two_player_settings(), SchedulerConfig::default());
    sched.start_loop();
    clock.set_tic(1);
    assert_eq!(sched.try_run_tics().outcome, FrameOutcome::Stalled);

    for fm in 0..3 {
        sched.transport_mut().queue_batch(batch_for(1, fm));
    }
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 3 });
    let moves: Vec<i8> = sched
        .engine()
        .steps()
        .iter()
        .map(|s| s.commands[1].forward_move)
        .collect();
    assert_eq!(moves, vec![0, 1, 2]);
}

#[test]
fn disconnect_falls_back_to_local_play() {
    let (mut sched, clock) = networked(&two_player_settings(), SchedulerConfig::default());
    {
        let t = sched.transport_mut();
        t.queue_batch(batch_for(1, 1));
        t.queue_batch(batch_for(1, 2));
        t.queue(Delivery::Disconnected);
    }
    sched.start_loop();

    clock.set_tic(1);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 1 });
    assert!(!sched.session().is_connected());
    assert_eq!(sched.session().cursors().received, TicIndex(2));
    assert_eq!(sched.metrics().disconnects, 1);

    // Disconnected slots carry only the local participant.
    let step = &sched.engine().steps()[0];
    assert!(step.present[0]);
    assert!(!step.present[1]);

    // Later frames run without waiting for anyone.
    clock.set_tic(2);
    let report = sched.try_run_tics();
    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 1 });
    assert_eq!(report.metrics.wait_polls, 0);
}

#[test]
fn disconnect_notice_leaves_ring_untouched() {
    let (mut sched, clock) = networked(&two_player_settings(), SchedulerConfig::default());
    sched.transport_mut().queue_batch(batch_for(1, 4));
    sched.start_loop();
    clock.set_tic(1);
    sched.try_run_tics();

    let ring_before = sched.session().ring().clone();
    let received_before = sched.session().cursors().received;

    sched.receive_batch(None);

    assert!(!sched.session().is_connected());
    assert_eq!(sched.session().cursors().received, received_before);
    for t in 0..ring_before.capacity() as u64 {
        assert_eq!(
            sched.session().ring().get(TicIndex(t)),
            ring_before.get(TicIndex(t))
        );
    }
}

#[test]
fn outbound_packets_repeat_extra_tics() {
    let settings = SessionSettings {
        extra_tics: 1,
        ..two_player_settings()
    };
    let (mut sched, clock) = networked(&settings, SchedulerConfig::default());
    for fm in 0..5 {
        sched.transport_mut().queue_batch(batch_for(1, fm));
    }
    sched.start_loop();

    clock.set_tic(1);
    sched.try_run_tics();
    clock.set_tic(2);
    sched.try_run_tics();

    let sent = sched.transport().sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].start, TicIndex(0));
    assert_eq!(sent[0].commands.len(), 1);
    // Tic 1 goes out with tic 0 repeated in front of it.
    assert_eq!(sent[1].start, TicIndex(0));
    assert_eq!(sent[1].commands.len(), 2);
    assert_eq!(sent[1].commands[1].consistency, 1);
    assert_eq!(sent[1].end(), TicIndex(2));
    assert_eq!(sched.session().cursors().sent, TicIndex(2));
}

#[test]
fn drone_runs_remote_commands_only() {
    let settings = SessionSettings {
        drone: true,
        ..two_player_settings()
    };
    let (mut sched, clock) = networked(&settings, SchedulerConfig::default());
    for fm in 0..3 {
        let batch = RemoteBatch::empty()
            .with(ParticipantId(0), remote_cmd(fm))
            .with(ParticipantId(1), remote_cmd(-fm));
        sched.transport_mut().queue_batch(batch);
    }
    sched.start_loop();

    clock.set_tic(1);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 3 });
    assert!(sched.engine().filled_tics().is_empty());
    assert!(sched.transport().sent().is_empty());
    // The drone's own column is written by the network.
    let steps = sched.engine().steps();
    assert_eq!(steps[2].commands[0].forward_move, 2);
    assert_eq!(steps[2].commands[1].forward_move, -2);
}

#[test]
fn disconnected_drone_ends_the_session() {
    let settings = SessionSettings {
        drone: true,
        ..two_player_settings()
    };
    let (mut sched, clock) = networked(&settings, SchedulerConfig::default());
    sched.transport_mut().queue(Delivery::Disconnected);
    sched.start_loop();

    clock.set_tic(1);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::SessionEnded);
    assert!(sched.engine().steps().is_empty());
}

#[test]
fn adaptive_follower_speeds_up_when_behind() {
    let settings = SessionSettings {
        local: ParticipantId(1),
        sync_mode: SyncMode::Adaptive,
        ..two_player_settings()
    };
    let (mut sched, clock) = networked(&settings, SchedulerConfig::default());
    for fm in 0..10 {
        sched.transport_mut().queue_batch(batch_for(0, fm));
    }
    sched.start_loop();

    clock.set_tic(1);
    let report = sched.try_run_tics();

    assert_eq!(report.outcome, FrameOutcome::Ran { tics: 1 });
    assert_eq!(sched.metrics().drift_rewinds, 1);
    // The rewound pacing clock yields one extra tic within the frame.
    assert_eq!(sched.session().cursors().produced, TicIndex(2));
}

#[test]
fn adaptive_key_participant_never_adapts() {
    let settings = SessionSettings {
        sync_mode: SyncMode::Adaptive,
        ..two_player_settings()
    };
    let (mut sched, clock) = networked(&settings, SchedulerConfig::default());
    for fm in 0..10 {
        sched.transport_mut().queue_batch(batch_for(1, fm));
    }
    sched.start_loop();

    clock.set_tic(1);
    sched.try_run_tics();

    assert_eq!(sched.metrics().drift_rewinds, 0);
    assert_eq!(sched.metrics().drift_skips, 0);
}
