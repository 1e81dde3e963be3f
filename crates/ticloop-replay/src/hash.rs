//! Hashing utilities for demo stream comparison.
//!
//! Uses FNV-1a for fast, deterministic hashing of recorded input. These
//! hashes are not cryptographically secure; they are used for fast
//! equality checks between recordings.

use ticloop_core::TicSet;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Incremental 64-bit FNV-1a hasher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fnv1a {
    state: u64,
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self { state: FNV_OFFSET }
    }
}

impl Fnv1a {
    /// A hasher at the offset basis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a single byte.
    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.state = (self.state ^ u64::from(byte)).wrapping_mul(FNV_PRIME);
    }

    /// Feed raw bytes in order.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_u8(b);
        }
    }

    /// Feed a u64 as 8 LE bytes.
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Feed one tic set: the presence mask, then each present command.
    ///
    /// Absent columns are skipped, so stale data in an unused column never
    /// changes the hash.
    pub fn write_tic_set(&mut self, set: &TicSet) {
        self.write_u8(set.present_mask());
        for (cmd, &here) in set.commands.iter().zip(&set.present) {
            if !here {
                continue;
            }
            self.write_u8(cmd.forward_move as u8);
            self.write_u8(cmd.side_move as u8);
            self.write(&cmd.angle_turn.to_le_bytes());
            self.write_u8(cmd.buttons);
        }
    }

    /// The current hash value.
    pub fn finish(&self) -> u64 {
        self.state
    }
}

/// Hash of a single tic set.
pub fn tic_set_hash(set: &TicSet) -> u64 {
    let mut h = Fnv1a::new();
    h.write_tic_set(set);
    h.finish()
}
