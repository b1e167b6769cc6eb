//! Indicator LEDs

use beacon_core::{Error, Result};
use beacon_hal::{digital_error, OutputPin};

use crate::advertisement::{AdvState, RadioIndicator};

/// Logical LED function; several roles may share one physical LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedRole {
    /// Lit while bring-up runs
    Activity,
    /// Lit briefly after a clean boot
    StatusOk,
    Green,
    Red,
}

/// Index of the LED serving each role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedMap {
    pub activity: usize,
    pub status_ok: usize,
    pub green: usize,
    pub red: usize,
}

impl LedMap {
    /// Two-LED tag: red shows activity, green shows a clean boot
    pub const RED_GREEN: Self = Self {
        activity: 0,
        status_ok: 1,
        green: 1,
        red: 0,
    };

    fn index(&self, role: LedRole) -> usize {
        match role {
            LedRole::Activity => self.activity,
            LedRole::StatusOk => self.status_ok,
            LedRole::Green => self.green,
            LedRole::Red => self.red,
        }
    }
}

pub struct LedTask<P: OutputPin, const L: usize> {
    pins: [P; L],
    map: LedMap,
    active_low: bool,
}

impl<P: OutputPin, const L: usize> LedTask<P, L> {
    pub fn new(pins: [P; L], map: LedMap, active_low: bool) -> Self {
        Self {
            pins,
            map,
            active_low,
        }
    }

    /// Configure every LED as off
    pub fn init(&mut self) -> Result<()> {
        for index in 0..L {
            self.drive(index, false)?;
        }
        Ok(())
    }

    /// Switch the LED serving `role`
    pub fn write(&mut self, role: LedRole, on: bool) -> Result<()> {
        self.drive(self.map.index(role), on)
    }

    pub fn pins(&self) -> &[P; L] {
        &self.pins
    }

    fn drive(&mut self, index: usize, on: bool) -> Result<()> {
        let pin = self.pins.get_mut(index).ok_or(Error::NotFound)?;
        let high = on != self.active_low;
        let result = if high { pin.set_high() } else { pin.set_low() };
        result.map_err(|err| Error::Driver(digital_error(err)))
    }
}

impl<P: OutputPin, const L: usize> RadioIndicator for LedTask<P, L> {
    fn radio_state(&mut self, state: AdvState) {
        let (green, red) = match state {
            AdvState::Scanning => (true, false),
            AdvState::Receiving => (false, true),
            AdvState::Idle => (false, false),
            AdvState::Transmitting | AdvState::Advertising => return,
        };
        let result = self
            .write(LedRole::Green, green)
            .and_then(|()| self.write(LedRole::Red, red));
        if let Err(err) = result {
            log::warn!("radio indicator: {}", err);
        }
    }
}
