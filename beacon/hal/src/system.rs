//! Watchdog and power-supply capabilities

use crate::DriverResult;

/// Hardware watchdog
pub trait Watchdog {
    /// Arm the watchdog; it cannot be disarmed until reset
    fn init(&mut self, interval_ms: u32) -> DriverResult<()>;

    /// Reload the watchdog counter
    fn feed(&mut self);
}

/// Power regulator control
pub trait Power {
    /// Switch the core supply to the DC/DC converter
    fn dcdc_init(&mut self) -> DriverResult<()>;
}
