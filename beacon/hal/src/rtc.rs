//! Real-time clock capability

use beacon_core::Timestamp;

use crate::DriverResult;

/// Monotonic millisecond clock
pub trait Rtc {
    fn init(&mut self) -> DriverResult<()>;

    fn uninit(&mut self) -> DriverResult<()>;

    /// Milliseconds since `init`; wraps with the underlying counter
    fn millis(&self) -> Timestamp;
}
