//! 16.16 fixed-point values.
//!
//! The only fixed-point quantity the scheduler touches is the clock-skew
//! offset, which the transport reports in fixed-point milliseconds.

use std::fmt;

/// Number of fractional bits in a [`Fixed`].
pub const FRACBITS: u32 = 16;

/// The raw value of `1.0` as a [`Fixed`].
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// A signed 16.16 fixed-point number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fixed(pub i32);

impl Fixed {
    /// Zero.
    pub const ZERO: Fixed = Fixed(0);

    /// Build from a whole number.
    pub fn from_int(v: i16) -> Self {
        Self(i32::from(v) << FRACBITS)
    }

    /// The raw 16.16 bit pattern.
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Integer part, truncated toward zero.
    ///
    /// `Fixed(-0x8000).to_int()` is `0`, not `-1`.
    pub fn to_int(self) -> i64 {
        i64::from(self.0) / i64::from(FRACUNIT)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", f64::from(self.0) / f64::from(FRACUNIT))
    }
}
