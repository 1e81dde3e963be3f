//! Lockstep tic scheduler for deterministic fixed-rate simulations.
//!
//! Provides [`LockstepScheduler`], which paces local command production
//! against a 35 Hz clock, merges remote commands from a [`Transport`],
//! and steps a [`SimulationEngine`] exactly once per tic in a globally
//! agreed order. Supports fixed-availability and adaptive sync modes,
//! command duplication (`ticdup`), and bounded waiting for late input.
//!
//! [`Transport`]: ticloop_core::Transport
//! [`SimulationEngine`]: ticloop_core::SimulationEngine

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod drift;
pub mod intake;
pub mod lockstep;
pub mod metrics;
pub mod producer;
pub mod pump;
pub mod ring;
pub mod session;
pub mod transport;

pub use clock::{adjusted_tics, MonotonicClock, TicClock};
pub use config::{ConfigError, SchedulerConfig, SessionSettings, SyncMode};
pub use lockstep::{frame_tic_count, FrameOutcome, FrameReport, LockstepScheduler};
pub use metrics::{FrameMetrics, SchedulerMetrics};
pub use pump::{PacingPump, PumpOutcome};
pub use ring::TicRing;
pub use session::{Cursors, SessionContext, SessionParams};
pub use transport::{channel_transport, ChannelTransport, LocalTransport, RemoteEndpoint};
