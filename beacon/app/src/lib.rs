#![no_std]
#![forbid(unsafe_code)]

//! # Beacon Application
//!
//! Power and lifecycle orchestration: brings the peripherals up in a fixed
//! order, runs the optional MCU self-tests, starts the relay and then drives
//! the main loop.
//!
//! ```text
//! boot:  self-tests -> watchdog -> gpio/leds -> rtc/timers/low-power -> dc/dc
//!        -> adc -> environmental -> nfc -> advertising -> status led -> scan
//! loop:  execute() -> feed watchdog -> wait()
//! ```

pub mod board;
pub mod lifecycle;
pub mod selftest;

pub use board::{Board, Peripherals, MAX_CHIP_SELECTS};
pub use lifecycle::Beacon;

pub use beacon_core::{AppConfig, Error, InitFailure, Result};
