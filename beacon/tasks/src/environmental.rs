//! MCU die temperature sampling

use core::ops::{Deref, DerefMut};

use beacon_core::Result;
use beacon_hal::{Bus, DspFunction, SensorConfig, SensorData, SensorDriver, SensorMode, Setting};
use beacon_queue::Enqueue;

use crate::sensor::{SensorChannel, SensorTask};

/// On-chip temperature sensor
pub const MCU_TEMPERATURE: SensorChannel = SensorChannel {
    name: "environmental",
    unit: "C",
    bus: Bus::None,
    handle: 0,
    defaults: SensorConfig {
        samplerate: Setting::Default,
        resolution: Setting::Default,
        scale: Setting::Default,
        dsp_function: DspFunction::Last,
        dsp_parameter: 1,
        mode: SensorMode::Single,
    },
};

pub struct EnvironmentalTask<D: SensorDriver> {
    sensor: SensorTask<D>,
    last: Option<SensorData>,
}

impl<D: SensorDriver> EnvironmentalTask<D> {
    pub fn new(driver: D) -> Self {
        Self {
            sensor: SensorTask::new(driver, MCU_TEMPERATURE),
            last: None,
        }
    }

    pub fn sample_temperature(&mut self) -> Result<SensorData> {
        let mut data = SensorData::default();
        self.sensor.sample()?;
        self.sensor.data_get(Some(&mut data))?;
        self.last = Some(data);
        Ok(data)
    }

    /// Last reading in degrees Celsius
    pub fn temperature(&self) -> Option<f32> {
        self.last.map(|data| data.value)
    }
}

impl<D: SensorDriver> Deref for EnvironmentalTask<D> {
    type Target = SensorTask<D>;

    fn deref(&self) -> &Self::Target {
        &self.sensor
    }
}

impl<D: SensorDriver> DerefMut for EnvironmentalTask<D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.sensor
    }
}

pub fn temperature_sample_task<C, D>(ctx: &mut C, _sink: &dyn Enqueue<C>, _payload: &[u8])
where
    C: AsMut<EnvironmentalTask<D>>,
    D: SensorDriver,
{
    match ctx.as_mut().sample_temperature() {
        Ok(data) => log::info!("temperature: {:.2} C at {}", data.value, data.timestamp),
        Err(err) => log::warn!("temperature sample failed: {}", err),
    }
}
