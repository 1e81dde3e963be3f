//! Demo recording, playback and determinism checks for ticloop sessions.
//!
//! Records the tic sets a session executes so the session can be played
//! back step for step, and verifies that playback reproduces the recorded
//! engine state.
//!
//! # Architecture
//!
//! - [`RecordingEngine`] wraps a `SimulationEngine` and records every step
//! - [`DemoWriter`] / [`DemoReader`] encode and decode the stream
//! - [`verify_demo`] and [`compare_streams`] check determinism
//! - [`DemoPolicy`] gates non-vanilla extensions on record and playback
//! - All I/O uses a custom binary codec (no serde dependency)
//!
//! # Format
//!
//! ```text
//! [MAGIC "TICL"] [VERSION u8] [DemoHeader]
//! [Frame 0] [Frame 1] ... [Frame N-1]
//! ```
//!
//! Each frame holds the step index, a presence mask, the commands of the
//! present participants and, when the demo records them, an engine state
//! digest.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod compare;
pub mod compat;
pub mod error;
pub mod hash;
pub mod reader;
pub mod recorder;
pub mod types;
pub mod writer;

pub use compare::{
    check_playback_extensions, compare_streams, replay_and_compare, verify_demo,
    DivergenceReport, VerifyReport,
};
pub use compat::{DemoPolicy, DemoSource};
pub use error::ReplayError;
pub use hash::{tic_set_hash, Fnv1a};
pub use reader::{DemoReader, FrameIter};
pub use recorder::RecordingEngine;
pub use types::{DemoFlags, DemoFrame, DemoHeader};
pub use writer::DemoWriter;

/// Magic bytes at the start of every demo stream.
pub const MAGIC: [u8; 4] = *b"TICL";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
