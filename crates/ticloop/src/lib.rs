//! Ticloop: a deterministic lockstep tic scheduler.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all ticloop sub-crates. For most users, adding `ticloop` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use ticloop::prelude::*;
//!
//! // A simulation that walks forward on every tic.
//! #[derive(Default)]
//! struct Walker {
//!     x: i64,
//! }
//!
//! impl SimulationEngine for Walker {
//!     fn sample_input(&mut self) {}
//!     fn advance_menu(&mut self) {}
//!     fn fill_command(&mut self, cmd: &mut TicCmd, _tic: TicIndex) {
//!         cmd.forward_move = 4;
//!     }
//!     fn step_simulation(
//!         &mut self,
//!         commands: &[TicCmd; MAX_PARTICIPANTS],
//!         present: &[bool; MAX_PARTICIPANTS],
//!     ) {
//!         if present[0] {
//!             self.x += i64::from(commands[0].forward_move);
//!         }
//!     }
//! }
//!
//! // A clock that moves one tic (about 29 ms) per read.
//! struct Ticker(u64);
//! impl TimeSource for Ticker {
//!     fn now_ms(&mut self) -> u64 {
//!         self.0 += 29;
//!         self.0
//!     }
//! }
//!
//! let mut sched = LockstepScheduler::new(
//!     Walker::default(),
//!     LocalTransport,
//!     Ticker(0),
//!     &SessionSettings::default(),
//!     SchedulerConfig::default(),
//! )
//! .unwrap();
//! sched.start_loop();
//! for _ in 0..5 {
//!     let report = sched.try_run_tics();
//!     assert_ne!(report.outcome, FrameOutcome::SessionEnded);
//! }
//! assert!(sched.engine().x > 0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ticloop-core` | Commands, tic indices, collaborator traits |
//! | [`engine`] | `ticloop-engine` | Clock, ring, pacing, intake and the scheduler |
//! | [`replay`] | `ticloop-replay` | Demo recording, playback and verification |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and collaborator traits (`ticloop-core`).
///
/// Contains [`types::TicCmd`], [`types::TicSet`], the wire-level
/// [`types::Delivery`], and the traits the scheduler drives
/// ([`types::SimulationEngine`], [`types::Transport`],
/// [`types::TimeSource`]).
pub use ticloop_core as types;

/// The lockstep scheduler and its parts (`ticloop-engine`).
///
/// [`engine::LockstepScheduler`] is the entry point. The clock adapter,
/// command ring, pacing pump and remote intake are exposed for hosts that
/// need to inspect session state.
pub use ticloop_engine as engine;

/// Demo recording and determinism verification (`ticloop-replay`).
///
/// Wrap an engine in [`replay::RecordingEngine`] to capture a session and
/// check it later with [`replay::verify_demo`].
pub use ticloop_replay as replay;

/// Common imports for typical ticloop usage.
///
/// ```rust
/// use ticloop::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use ticloop_core::{
        Buttons, Delivery, OutboundPacket, ParticipantId, RemoteBatch, SimulationEngine,
        StateDigest, TicCmd, TicIndex, TicSet, TimeSource, Transport, MAX_PARTICIPANTS,
    };

    // Scheduler
    pub use ticloop_engine::{
        ConfigError, FrameOutcome, FrameReport, LocalTransport, LockstepScheduler,
        MonotonicClock, SchedulerConfig, SessionSettings, SyncMode,
    };

    // Demos
    pub use ticloop_replay::{DemoPolicy, DemoReader, DemoSource, RecordingEngine, ReplayError};
}
