//! Core types and traits for the ticloop lockstep scheduler.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the ticloop workspace:
//! tic and participant identifiers, the fixed-size [`TicCmd`] input
//! record, the per-tic [`TicSet`], the 16.16 [`Fixed`] clock offset, and
//! the collaborator traits the scheduler drives ([`SimulationEngine`],
//! [`TimeSource`], [`Transport`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod error;
pub mod fixed;
pub mod id;
pub mod traits;
pub mod transport;

pub use command::{Buttons, RemoteBatch, TicCmd, TicSet};
pub use error::SessionError;
pub use fixed::{Fixed, FRACBITS, FRACUNIT};
pub use id::{ParticipantId, TicIndex, MAX_PARTICIPANTS};
pub use traits::{SimulationEngine, StateDigest, TimeSource};
pub use transport::{Delivery, OutboundPacket, Transport};

/// Fixed simulation rate in tics per second.
pub const TICRATE: i64 = 35;

/// Default number of tic slots retained by the command ring.
pub const BACKUP_TICS: usize = 128;
