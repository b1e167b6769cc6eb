//! Monotonic millisecond timestamps
//!
//! The RTC counter backing these values wraps, so ordering is only meaningful
//! between timestamps less than half the counter range apart.

use core::fmt;

/// Millisecond timestamp taken from the real-time clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp(u32);

impl Timestamp {
    /// Zero timestamp
    pub const ZERO: Self = Self(0);

    /// Create a timestamp from a raw millisecond count
    pub const fn from_millis(millis: u32) -> Self {
        Self(millis)
    }

    /// Get the raw millisecond count
    pub const fn millis(self) -> u32 {
        self.0
    }

    /// Timestamp `millis` later, wrapping with the counter
    pub const fn add_millis(self, millis: u32) -> Self {
        Self(self.0.wrapping_add(millis))
    }

    /// Milliseconds elapsed since an earlier timestamp (handles wraparound)
    pub const fn elapsed_since(self, earlier: Timestamp) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Check if this timestamp is at or past `deadline` (handles wraparound)
    pub const fn has_reached(self, deadline: Timestamp) -> bool {
        self.0.wrapping_sub(deadline.0) < u32::MAX / 2
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Timestamp {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}ms", self.0);
    }
}

/// Timer expiry behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Fire once, then disarm
    OneShot,
    /// Fire every interval until stopped
    Periodic,
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerMode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::OneShot => defmt::write!(fmt, "OneShot"),
            Self::Periodic => defmt::write!(fmt, "Periodic"),
        }
    }
}
