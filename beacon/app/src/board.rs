//! Board abstraction: the set of drivers a target hands to the firmware

use heapless::Vec;

use beacon_hal::{DelayNs, Nfc, OutputPin, Power, Radio, Rtc, SensorDriver, Watchdog};
use beacon_tasks::LedMap;

/// Largest number of SPI chip selects a board may declare
pub const MAX_CHIP_SELECTS: usize = 4;

/// Driver types of a target board
pub trait Board {
    type Radio: Radio;
    /// ADC bound to the supply rail
    type Adc: SensorDriver;
    /// MCU die temperature sensor
    type Temperature: SensorDriver;
    type Rtc: Rtc;
    type Watchdog: Watchdog;
    type Power: Power;
    type Nfc: Nfc;
    type Led: OutputPin;
    type ChipSelect: OutputPin;
    type Delay: DelayNs;
}

/// Driver instances of a board, moved into the application at start-up
pub struct Peripherals<B: Board, const L: usize> {
    pub radio: B::Radio,
    pub adc: B::Adc,
    pub temperature: B::Temperature,
    pub rtc: B::Rtc,
    pub watchdog: B::Watchdog,
    pub power: B::Power,
    /// `None` when no antenna is fitted
    pub nfc: Option<B::Nfc>,
    pub leds: [B::Led; L],
    pub led_map: LedMap,
    pub chip_selects: Vec<B::ChipSelect, MAX_CHIP_SELECTS>,
    pub delay: B::Delay,
}
