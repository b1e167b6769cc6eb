//! Simulated sensor tag

use heapless::Vec;

use beacon_app::{Board, Peripherals};
use beacon_tasks::LedMap;

use crate::sim::{
    Air, Clock, SimAdc, SimDelay, SimNfc, SimPin, SimPower, SimRadio, SimRtc, SimTemperature,
    SimWatchdog,
};

pub struct SimBoard;

impl Board for SimBoard {
    type Radio = SimRadio;
    type Adc = SimAdc;
    type Temperature = SimTemperature;
    type Rtc = SimRtc;
    type Watchdog = SimWatchdog;
    type Power = SimPower;
    type Nfc = SimNfc;
    type Led = SimPin;
    type ChipSelect = SimPin;
    type Delay = SimDelay;
}

/// Knobs of the simulated hardware
#[derive(Debug, Clone)]
pub struct SimOptions {
    /// Battery voltage seen by the ADC
    pub supply_volts: f32,
    pub nfc_fitted: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            supply_volts: 3.0,
            nfc_fitted: true,
        }
    }
}

impl SimBoard {
    /// Build the board's drivers around a shared clock and radio medium
    pub fn peripherals(clock: Clock, air: Air, options: &SimOptions) -> Peripherals<SimBoard, 2> {
        let mut chip_selects = Vec::new();
        for name in ["cs_accelerometer", "cs_environmental"] {
            // Fits: two of MAX_CHIP_SELECTS
            let _ = chip_selects.push(SimPin::new(name));
        }
        Peripherals {
            radio: SimRadio::new(air),
            adc: SimAdc::new(clock, options.supply_volts),
            temperature: SimTemperature::new(clock),
            rtc: SimRtc::new(clock),
            watchdog: SimWatchdog::default(),
            power: SimPower::default(),
            nfc: options.nfc_fitted.then(SimNfc::default),
            leds: [SimPin::new("led_red"), SimPin::new("led_green")],
            led_map: LedMap::RED_GREEN,
            chip_selects,
            delay: SimDelay,
        }
    }
}
