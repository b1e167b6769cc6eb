#![no_std]
#![forbid(unsafe_code)]

//! # Beacon HAL
//!
//! Capability traits for the peripherals the firmware core drives. Every call
//! is synchronous, bounded in time and returns a [`DriverResult`]. Board
//! support crates implement these traits; the core never touches registers.
//!
//! Digital outputs (LEDs, chip selects) and blocking delays use the
//! `embedded-hal` traits directly.

pub mod nfc;
pub mod radio;
pub mod rtc;
pub mod sensor;
pub mod system;

pub use beacon_core::{DriverError, DriverResult};
pub use embedded_hal::delay::DelayNs;
pub use embedded_hal::digital::OutputPin;

pub use nfc::Nfc;
pub use radio::{Address, Radio, RadioEvent, ScanResult, ADV_DATA_MAX};
pub use rtc::Rtc;
pub use sensor::{Bus, DspFunction, SensorConfig, SensorData, SensorDriver, SensorMode, Setting};
pub use system::{Power, Watchdog};

/// Map an `embedded-hal` digital error onto a driver status
pub fn digital_error<E: embedded_hal::digital::Error>(err: E) -> DriverError {
    match err.kind() {
        embedded_hal::digital::ErrorKind::Other => DriverError::Internal,
        _ => DriverError::NotSupported,
    }
}
