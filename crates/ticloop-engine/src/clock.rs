//! Wall-clock to tic conversion at the fixed 35 Hz rate.

use std::time::Instant;

use ticloop_core::{Fixed, TimeSource, TICRATE};

use crate::config::SyncMode;

/// Convert a millisecond reading into a tic count.
///
/// The offset's integer part is added first, but only when `mode`
/// applies offsets. The product is computed in 64 bits and floored, so
/// negative adjusted times still land on the tic that contains them.
pub fn adjusted_tics(now_ms: u64, offset: Fixed, mode: SyncMode) -> i64 {
    let mut ms = i64::try_from(now_ms).unwrap_or(i64::MAX / TICRATE);
    if mode.applies_offset() {
        ms += offset.to_int();
    }
    ms.saturating_mul(TICRATE).div_euclid(1000)
}

/// A [`TimeSource`] paired with the session's clock-skew offset.
///
/// The offset starts at zero and is only ever changed by the transport.
#[derive(Debug)]
pub struct TicClock<C> {
    source: C,
    offset: Fixed,
    mode: SyncMode,
}

impl<C: TimeSource> TicClock<C> {
    /// Wrap a time source with a zero offset.
    pub fn new(source: C, mode: SyncMode) -> Self {
        Self {
            source,
            offset: Fixed::ZERO,
            mode,
        }
    }

    /// Tics elapsed since the source's origin, skew-adjusted.
    pub fn adjusted_tics(&mut self) -> i64 {
        adjusted_tics(self.source.now_ms(), self.offset, self.mode)
    }

    /// Replace the clock-skew offset.
    pub fn set_offset(&mut self, offset: Fixed) {
        self.offset = offset;
    }

    /// Current clock-skew offset.
    pub fn offset(&self) -> Fixed {
        self.offset
    }

    /// The wrapped time source.
    pub fn source(&self) -> &C {
        &self.source
    }

    /// Mutable access to the wrapped time source.
    pub fn source_mut(&mut self) -> &mut C {
        &mut self.source
    }

    /// Unwrap the time source.
    pub fn into_source(self) -> C {
        self.source
    }
}

/// Milliseconds since construction, from [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start counting from now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now_ms(&mut self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
