//! Battery voltage sampling on the ADC

use core::ops::{Deref, DerefMut};

use beacon_core::{Result, ADC_DSP_PARAMETER, ADC_RESOLUTION_BITS};
use beacon_hal::{Bus, DspFunction, SensorConfig, SensorData, SensorDriver, SensorMode, Setting};
use beacon_queue::Enqueue;

use crate::sensor::{SensorChannel, SensorTask};

/// ADC input wired to the supply rail
pub const ADC_CHANNEL_VDD: u8 = 9;

/// Supply voltage channel with the firmware's default ADC configuration
pub const ADC_VDD: SensorChannel = SensorChannel {
    name: "adc",
    unit: "V",
    bus: Bus::None,
    handle: ADC_CHANNEL_VDD,
    defaults: SensorConfig {
        samplerate: Setting::Min,
        resolution: Setting::Value(ADC_RESOLUTION_BITS),
        scale: Setting::Default,
        dsp_function: DspFunction::Last,
        dsp_parameter: ADC_DSP_PARAMETER,
        mode: SensorMode::Single,
    },
};

/// Sensor task bound to the supply voltage
pub struct AdcTask<D: SensorDriver> {
    sensor: SensorTask<D>,
    last: Option<SensorData>,
}

impl<D: SensorDriver> AdcTask<D> {
    pub fn new(driver: D) -> Self {
        Self {
            sensor: SensorTask::new(driver, ADC_VDD),
            last: None,
        }
    }

    /// Trigger a conversion and read it back
    pub fn sample_battery(&mut self) -> Result<SensorData> {
        let mut data = SensorData::default();
        self.sensor.sample()?;
        self.sensor.data_get(Some(&mut data))?;
        self.last = Some(data);
        Ok(data)
    }

    /// Supply voltage of the last reading
    pub fn battery_millivolts(&self) -> Option<u32> {
        self.last.map(|data| (data.value * 1000.0) as u32)
    }
}

impl<D: SensorDriver> Deref for AdcTask<D> {
    type Target = SensorTask<D>;

    fn deref(&self) -> &Self::Target {
        &self.sensor
    }
}

impl<D: SensorDriver> DerefMut for AdcTask<D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.sensor
    }
}

/// Periodic battery sample, scheduled from the timer wheel
pub fn battery_sample_task<C, D>(ctx: &mut C, _sink: &dyn Enqueue<C>, _payload: &[u8])
where
    C: AsMut<AdcTask<D>>,
    D: SensorDriver,
{
    let adc = ctx.as_mut();
    match adc.sample_battery() {
        Ok(_) => {
            if let Some(mv) = adc.battery_millivolts() {
                log::info!("battery: {} mV", mv);
            }
        }
        Err(err) => log::warn!("battery sample failed: {}", err),
    }
}
