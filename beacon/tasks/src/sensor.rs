//! Generic sensor sampling task
//!
//! Wraps one [`SensorDriver`] instance. The task is the only owner of the
//! driver: it binds the hardware channel, applies configuration, triggers
//! single-shot conversions and hands out the latest latched sample.

use log::Level;

use beacon_core::{Error, Result};
use beacon_hal::{Bus, Rtc, SensorConfig, SensorData, SensorDriver, SensorMode};

/// Hardware channel a sensor task binds to, with its default configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorChannel {
    pub name: &'static str,
    /// Unit of the sample value, used when logging the scale
    pub unit: &'static str,
    pub bus: Bus,
    pub handle: u8,
    pub defaults: SensorConfig,
}

/// Requested and applied configuration of a `configure` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configured {
    pub requested: SensorConfig,
    pub actual: SensorConfig,
}

impl Configured {
    /// Check if the driver changed any requested value
    pub fn is_clamped(&self) -> bool {
        self.requested != self.actual
    }
}

/// Log a sensor configuration as a block of lines
pub fn log_configuration(level: Level, config: &SensorConfig, unit: &str) {
    log::log!(level, "  sample rate: {} Hz", config.samplerate);
    log::log!(level, "  resolution:  {} bits", config.resolution);
    log::log!(level, "  scale:       {} {}", config.scale, unit);
    log::log!(level, "  dsp:         {} x {}", config.dsp_function, config.dsp_parameter);
    log::log!(level, "  mode:        {}", config.mode);
}

pub struct SensorTask<D: SensorDriver> {
    driver: D,
    channel: SensorChannel,
    bound: bool,
    config: Option<SensorConfig>,
}

impl<D: SensorDriver> SensorTask<D> {
    pub fn new(driver: D, channel: SensorChannel) -> Self {
        Self {
            driver,
            channel,
            bound: false,
            config: None,
        }
    }

    /// Bind the channel and apply its default configuration
    ///
    /// Fails with [`Error::NotFound`] when the hardware channel cannot be bound.
    pub fn init(&mut self) -> Result<Configured> {
        if let Err(err) = self.driver.init(self.channel.bus, self.channel.handle) {
            log::error!("{}: channel {} not bound: {}", self.channel.name, self.channel.handle, err);
            return Err(Error::NotFound);
        }
        self.bound = true;
        self.configure(self.channel.defaults)
    }

    /// Release the channel; sampling fails with `InvalidState` afterwards
    pub fn uninit(&mut self) -> Result<()> {
        self.bound = false;
        self.config = None;
        self.driver.uninit().map_err(Error::from)
    }

    /// Apply `requested`, logging it and the configuration the driver applied
    ///
    /// Drivers clamp unsupported values; the applied values are read back
    /// rather than assumed.
    pub fn configure(&mut self, requested: SensorConfig) -> Result<Configured> {
        if !self.bound {
            return Err(Error::InvalidState);
        }
        log::info!("{}: requested configuration", self.channel.name);
        log_configuration(Level::Info, &requested, self.channel.unit);

        let mut actual = requested;
        self.driver.configuration_set(&mut actual)?;

        log::info!("{}: actual configuration", self.channel.name);
        log_configuration(Level::Info, &actual, self.channel.unit);

        self.config = Some(actual);
        Ok(Configured { requested, actual })
    }

    /// Trigger one conversion
    ///
    /// In continuous mode this is a no-op for the driver but still valid.
    pub fn sample(&mut self) -> Result<()> {
        if !self.bound {
            return Err(Error::InvalidState);
        }
        let mut mode = SensorMode::Single;
        self.driver.mode_set(&mut mode)?;
        Ok(())
    }

    /// Copy the latest latched conversion into `out`
    ///
    /// A missing destination is reported before an unbound sensor.
    pub fn data_get(&mut self, out: Option<&mut SensorData>) -> Result<()> {
        let out = out.ok_or(Error::NullArgument)?;
        if !self.bound {
            return Err(Error::InvalidState);
        }
        self.driver.data_get(out)?;
        Ok(())
    }

    /// Like [`data_get`](Self::data_get), stamping the sample from `rtc`
    pub fn data_get_stamped(&mut self, out: Option<&mut SensorData>, rtc: &impl Rtc) -> Result<()> {
        let out = out.ok_or(Error::NullArgument)?;
        self.data_get(Some(&mut *out))?;
        out.timestamp = rtc.millis();
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.bound
    }

    /// Configuration applied by the last successful `configure`
    pub fn config(&self) -> Option<SensorConfig> {
        self.config
    }

    pub fn channel(&self) -> &SensorChannel {
        &self.channel
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
