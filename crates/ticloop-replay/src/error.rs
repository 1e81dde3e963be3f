//! Error types for demo recording and playback.

use std::fmt;
use std::io;

/// Errors that can occur during demo recording, playback, or verification.
#[derive(Debug)]
pub enum ReplayError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The stream does not start with the expected `b"TICL"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the stream.
        found: u8,
    },
    /// The header could not be decoded or describes an impossible session.
    MalformedHeader {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A frame could not be decoded (truncated or corrupt data).
    MalformedFrame {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The demo uses an extension the compatibility policy does not allow.
    ExtensionRefused {
        /// Name of the refused extension.
        feature: &'static str,
    },
    /// A recorded state digest does not match the replayed state.
    DigestMismatch {
        /// The tic at which the mismatch was detected.
        tic: u64,
        /// Digest from the demo.
        recorded: u64,
        /// Digest of the replayed engine.
        replayed: u64,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"TICL\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::MalformedHeader { detail } => write!(f, "malformed header: {detail}"),
            Self::MalformedFrame { detail } => write!(f, "malformed frame: {detail}"),
            Self::ExtensionRefused { feature } => {
                write!(f, "demo extension refused: {feature}")
            }
            Self::DigestMismatch {
                tic,
                recorded,
                replayed,
            } => {
                write!(
                    f,
                    "state digest mismatch at tic {tic}: \
                     recorded={recorded:#018x}, replayed={replayed:#018x}"
                )
            }
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ReplayError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
