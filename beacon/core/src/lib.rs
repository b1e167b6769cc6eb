#![no_std]
#![forbid(unsafe_code)]

//! # Beacon Core
//!
//! Error taxonomy, initialisation reports, wrapping timestamps and the static
//! application configuration shared by every layer of the beacon firmware.

use core::fmt;

pub mod config;
pub mod report;
pub mod time;

pub use config::*;
pub use report::*;
pub use time::*;

/// Result type used throughout the firmware
pub type Result<T> = core::result::Result<T, Error>;

/// Result type returned by capability drivers
pub type DriverResult<T> = core::result::Result<T, DriverError>;

/// Status reported by a peripheral driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// Hardware resource does not exist on this board
    NotFound,
    /// Peripheral is not in a state that allows the operation
    InvalidState,
    /// Parameter rejected by the driver
    InvalidParam,
    /// Operation not supported by this driver
    NotSupported,
    /// Peripheral is busy
    Busy,
    /// Operation timed out
    Timeout,
    /// Internal driver failure
    Internal,
    /// Vendor-specific error code
    Vendor(u32),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "resource not found"),
            Self::InvalidState => write!(f, "invalid state"),
            Self::InvalidParam => write!(f, "invalid parameter"),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::Busy => write!(f, "peripheral busy"),
            Self::Timeout => write!(f, "operation timeout"),
            Self::Internal => write!(f, "internal driver error"),
            Self::Vendor(code) => write!(f, "vendor error code: {:#x}", code),
        }
    }
}

/// Error types for firmware operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Hardware resource missing
    NotFound,
    /// Capability used before or without initialisation
    InvalidState,
    /// Required output destination was not supplied
    NullArgument,
    /// Event queue is full
    QueueFull,
    /// Payload does not fit in a queue slot
    DataSize,
    /// No free instance left in a statically sized pool
    NoMemory,
    /// Error reported by a peripheral driver
    Driver(DriverError),
    /// Unrecoverable error, halts bring-up
    Fatal,
}

impl Error {
    /// Check if the error stops bring-up on its own
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal)
    }
}

impl From<DriverError> for Error {
    fn from(err: DriverError) -> Self {
        Error::Driver(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "Resource not found"),
            Error::InvalidState => write!(f, "Invalid state"),
            Error::NullArgument => write!(f, "Missing output argument"),
            Error::QueueFull => write!(f, "Event queue is full"),
            Error::DataSize => write!(f, "Payload exceeds slot size"),
            Error::NoMemory => write!(f, "No free instance"),
            Error::Driver(err) => write!(f, "Driver error: {}", err),
            Error::Fatal => write!(f, "Fatal error"),
        }
    }
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}

#[cfg(feature = "defmt")]
impl defmt::Format for DriverError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NotFound => defmt::write!(fmt, "NotFound"),
            Self::InvalidState => defmt::write!(fmt, "InvalidState"),
            Self::InvalidParam => defmt::write!(fmt, "InvalidParam"),
            Self::NotSupported => defmt::write!(fmt, "NotSupported"),
            Self::Busy => defmt::write!(fmt, "Busy"),
            Self::Timeout => defmt::write!(fmt, "Timeout"),
            Self::Internal => defmt::write!(fmt, "Internal"),
            Self::Vendor(code) => defmt::write!(fmt, "Vendor({=u32:#x})", code),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::NotFound => defmt::write!(fmt, "NotFound"),
            Error::InvalidState => defmt::write!(fmt, "InvalidState"),
            Error::NullArgument => defmt::write!(fmt, "NullArgument"),
            Error::QueueFull => defmt::write!(fmt, "QueueFull"),
            Error::DataSize => defmt::write!(fmt, "DataSize"),
            Error::NoMemory => defmt::write!(fmt, "NoMemory"),
            Error::Driver(err) => defmt::write!(fmt, "Driver({})", err),
            Error::Fatal => defmt::write!(fmt, "Fatal"),
        }
    }
}
