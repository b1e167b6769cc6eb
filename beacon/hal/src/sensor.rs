//! Sensor driver capability (ADC, MCU temperature)

use core::fmt;

use beacon_core::Timestamp;

use crate::DriverResult;

/// Bus a sensor is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    /// On-chip peripheral
    None,
    Spi,
    I2c,
}

/// Value of a numeric sensor setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    /// Driver default
    Default,
    /// Smallest supported value
    Min,
    /// Largest supported value
    Max,
    /// Keep the current value
    NoChange,
    /// Explicit value
    Value(u8),
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Default => write!(f, "DEFAULT"),
            Setting::Min => write!(f, "MIN"),
            Setting::Max => write!(f, "MAX"),
            Setting::NoChange => write!(f, "NO CHANGE"),
            Setting::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Post-filter applied to raw samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DspFunction {
    /// Last value hold
    Last,
    Iir,
    LowPass,
    HighPass,
    Oversampling,
}

impl fmt::Display for DspFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DspFunction::Last => "LAST",
            DspFunction::Iir => "IIR",
            DspFunction::LowPass => "LOW PASS",
            DspFunction::HighPass => "HIGH PASS",
            DspFunction::Oversampling => "OVERSAMPLING",
        };
        f.write_str(name)
    }
}

/// Sampling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorMode {
    Sleep,
    /// One sample per trigger
    Single,
    /// Free-running sampling
    Continuous,
}

impl fmt::Display for SensorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorMode::Sleep => f.write_str("SLEEP"),
            SensorMode::Single => f.write_str("SINGLE"),
            SensorMode::Continuous => f.write_str("CONTINUOUS"),
        }
    }
}

/// Sensor configuration; drivers overwrite fields with the values they applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    pub samplerate: Setting,
    pub resolution: Setting,
    pub scale: Setting,
    pub dsp_function: DspFunction,
    pub dsp_parameter: u8,
    pub mode: SensorMode,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            samplerate: Setting::Default,
            resolution: Setting::Default,
            scale: Setting::Default,
            dsp_function: DspFunction::Last,
            dsp_parameter: 1,
            mode: SensorMode::Sleep,
        }
    }
}

/// Latest latched sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorData {
    pub timestamp: Timestamp,
    /// Volts for the ADC, degrees Celsius for temperature
    pub value: f32,
}

/// Configurable sensor driver instance
pub trait SensorDriver {
    /// Bind the driver to a hardware channel
    fn init(&mut self, bus: Bus, handle: u8) -> DriverResult<()>;

    /// Release the hardware channel
    fn uninit(&mut self) -> DriverResult<()>;

    /// Apply a configuration; unsupported values are clamped and written back
    fn configuration_set(&mut self, config: &mut SensorConfig) -> DriverResult<()>;

    /// Read back the active configuration
    fn configuration_get(&mut self, config: &mut SensorConfig) -> DriverResult<()>;

    /// Change the sampling mode; `Single` triggers one conversion
    fn mode_set(&mut self, mode: &mut SensorMode) -> DriverResult<()>;

    /// Copy the latest latched conversion
    fn data_get(&mut self, data: &mut SensorData) -> DriverResult<()>;
}
