#![no_std]
#![forbid(unsafe_code)]

//! # Beacon Tasks
//!
//! Application tasks run by the scheduler. Each task owns exactly one
//! peripheral capability; interrupt glue only decodes hardware events into
//! queue payloads, and every driver call happens from the main loop.

pub mod adc;
pub mod advertisement;
pub mod environmental;
pub mod gpio;
pub mod led;
pub mod nfc;
pub mod sensor;

pub use adc::AdcTask;
pub use advertisement::{
    radio_irq, repeat_task, AdvState, Advertisement, NoIndicator, RadioIndicator, RelayContext,
    RelayStats,
};
pub use environmental::EnvironmentalTask;
pub use gpio::chip_selects_init;
pub use led::{LedMap, LedRole, LedTask};
pub use nfc::NfcTask;
pub use sensor::{Configured, SensorChannel, SensorTask};

pub use beacon_core::{Error, Result};
