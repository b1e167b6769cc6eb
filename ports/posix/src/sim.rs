//! Simulated peripherals and interrupt sources

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use beacon_core::{DriverError, DriverResult, Timestamp};
use beacon_hal::{
    Address, Bus, DelayNs, DspFunction, Nfc, Power, Radio, RadioEvent, Rtc, ScanResult,
    SensorConfig, SensorData, SensorDriver, SensorMode, Setting, Watchdog, ADV_DATA_MAX,
};
use beacon_queue::EventQueue;
use beacon_sched::TimerWheel;
use beacon_tasks::{radio_irq, RelayContext};
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::idle::Wakeup;
use crate::runtime::is_running;

/// Period of the simulated interrupt threads
const TICK: Duration = Duration::from_millis(10);

/// Monotonic clock shared by the RTC, the timer ticker and the ADC
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.epoch.elapsed().as_millis() as u32)
    }
}

/// What the simulated radio is doing, shared with the radio thread
#[derive(Debug, Default)]
pub struct AirState {
    pub scanning: bool,
    pub advertising: bool,
    pub address: u64,
    pub scan_interval_ms: u32,
    pub scan_window_ms: u32,
    /// Payload handed to `send_raw`, not yet reported as sent
    pub pending_tx: Option<Vec<u8>>,
    pub transmitted: u32,
}

pub type Air = Arc<Mutex<AirState>>;

fn lock(air: &Air) -> MutexGuard<'_, AirState> {
    air.lock().unwrap_or_else(|e| e.into_inner())
}

/// Tx power levels of the radio, ascending
const TX_POWER_LEVELS: [i8; 9] = [-40, -20, -16, -12, -8, -4, 0, 3, 4];

pub struct SimRadio {
    air: Air,
    initialized: bool,
}

impl SimRadio {
    pub fn new(air: Air) -> Self {
        Self {
            air,
            initialized: false,
        }
    }

    fn ensure_init(&self) -> DriverResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(DriverError::InvalidState)
        }
    }
}

impl Radio for SimRadio {
    fn advertising_init(&mut self) -> DriverResult<()> {
        self.initialized = true;
        Ok(())
    }

    fn advertising_uninit(&mut self) -> DriverResult<()> {
        self.initialized = false;
        let mut air = lock(&self.air);
        air.scanning = false;
        air.advertising = false;
        Ok(())
    }

    fn tx_power_set(&mut self, dbm: &mut i8) -> DriverResult<()> {
        self.ensure_init()?;
        *dbm = TX_POWER_LEVELS
            .iter()
            .rev()
            .find(|level| **level <= *dbm)
            .copied()
            .unwrap_or(TX_POWER_LEVELS[0]);
        Ok(())
    }

    fn manufacturer_id_set(&mut self, _id: u16) -> DriverResult<()> {
        self.ensure_init()
    }

    fn tx_interval_set(&mut self, interval_ms: u32) -> DriverResult<()> {
        self.ensure_init()?;
        if !(20..=10_240).contains(&interval_ms) {
            return Err(DriverError::InvalidParam);
        }
        Ok(())
    }

    fn scan_parameters_set(&mut self, interval_ms: u32, window_ms: u32, timeout_ms: u32) -> DriverResult<()> {
        self.ensure_init()?;
        if window_ms == 0 || window_ms > interval_ms || timeout_ms < interval_ms {
            return Err(DriverError::InvalidParam);
        }
        let mut air = lock(&self.air);
        air.scan_interval_ms = interval_ms;
        air.scan_window_ms = window_ms;
        Ok(())
    }

    fn advertising_start(&mut self) -> DriverResult<()> {
        self.ensure_init()?;
        lock(&self.air).advertising = true;
        Ok(())
    }

    fn advertising_stop(&mut self) -> DriverResult<()> {
        let mut air = lock(&self.air);
        if !air.advertising {
            return Err(DriverError::InvalidState);
        }
        air.advertising = false;
        Ok(())
    }

    fn scan_start(&mut self) -> DriverResult<()> {
        self.ensure_init()?;
        lock(&self.air).scanning = true;
        Ok(())
    }

    fn scan_stop(&mut self) -> DriverResult<()> {
        let mut air = lock(&self.air);
        if !air.scanning {
            return Err(DriverError::InvalidState);
        }
        air.scanning = false;
        Ok(())
    }

    fn address_set(&mut self, address: u64) -> DriverResult<()> {
        self.ensure_init()?;
        lock(&self.air).address = address;
        Ok(())
    }

    fn send_raw(&mut self, data: &[u8]) -> DriverResult<()> {
        self.ensure_init()?;
        if data.len() > ADV_DATA_MAX {
            return Err(DriverError::InvalidParam);
        }
        let mut air = lock(&self.air);
        if air.pending_tx.is_some() {
            return Err(DriverError::Busy);
        }
        air.pending_tx = Some(data.to_vec());
        Ok(())
    }
}

/// Advertisement of one of a handful of neighbouring tags
fn neighbour_advertisement(seq: u8) -> Option<ScanResult> {
    let address = Address([0xC0, 0xFF, 0xEE, 0x00, 0x00, seq % 4]);
    let data = [0x02, 0x01, 0x06, 0x05, 0xFF, 0x99, 0x04, 0x05, seq];
    ScanResult::new(address, -60 - (seq % 20) as i8, &data)
}

/// Radio interrupt source
///
/// Reports `Sent` as soon as a payload was handed to the radio and, while
/// scanning, an overheard advertisement every `rx_interval`.
pub fn spawn_radio<C: RelayContext + 'static>(
    air: Air,
    wakeup: Arc<Wakeup>,
    queue: &'static EventQueue<C>,
    rx_interval: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let raise = |event: RadioEvent| match radio_irq::<C>(event, queue) {
            Ok(()) => wakeup.notify(),
            Err(err) => log::warn!("radio interrupt dropped: {}", err),
        };
        let mut seq: u8 = 0;
        let mut last_rx = Instant::now();
        while is_running() {
            thread::sleep(TICK);
            let (sent, scanning) = {
                let mut air = lock(&air);
                let sent = air.pending_tx.take();
                if sent.is_some() {
                    air.transmitted += 1;
                }
                (sent.map(|data| (air.address, data)), air.scanning)
            };
            if let Some((address, data)) = sent {
                log::debug!("on air from {}: {:02x?}", Address::from_u64(address), data);
                raise(RadioEvent::Sent);
            } else if scanning && last_rx.elapsed() >= rx_interval {
                last_rx = Instant::now();
                if let Some(scan) = neighbour_advertisement(seq) {
                    raise(RadioEvent::Received(scan));
                }
                seq = seq.wrapping_add(1);
            }
        }
    })
}

/// RTC compare interrupt source driving the software timers
pub fn spawn_ticker<C: 'static>(
    clock: Clock,
    wakeup: Arc<Wakeup>,
    timers: &'static TimerWheel<C>,
    queue: &'static EventQueue<C>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while is_running() {
            thread::sleep(TICK);
            if timers.tick(clock.now(), queue) > 0 {
                wakeup.notify();
            }
        }
    })
}

/// Resolutions the simulated SAR ADC can convert at
const ADC_RESOLUTIONS: [u8; 4] = [8, 10, 12, 14];
const ADC_DEFAULT_RESOLUTION: u8 = 10;
/// Input range in volts
const ADC_FULL_SCALE: f32 = 3.6;

fn adc_resolution(setting: Setting, current: u8) -> u8 {
    match setting {
        Setting::Min => ADC_RESOLUTIONS[0],
        Setting::Max => ADC_RESOLUTIONS[ADC_RESOLUTIONS.len() - 1],
        Setting::Default => ADC_DEFAULT_RESOLUTION,
        Setting::NoChange => current,
        Setting::Value(bits) => ADC_RESOLUTIONS
            .iter()
            .rev()
            .find(|supported| **supported <= bits)
            .copied()
            .unwrap_or(ADC_RESOLUTIONS[0]),
    }
}

fn quantize(volts: f32, bits: u8) -> f32 {
    let steps = ((1u32 << bits) - 1) as f32;
    let code = (volts / ADC_FULL_SCALE * steps).round().clamp(0.0, steps);
    code * ADC_FULL_SCALE / steps
}

/// Supply-rail ADC, single-shot only
pub struct SimAdc {
    clock: Clock,
    supply_volts: f32,
    bound: bool,
    resolution: u8,
    latched: SensorData,
    conversions: u32,
}

impl SimAdc {
    pub fn new(clock: Clock, supply_volts: f32) -> Self {
        Self {
            clock,
            supply_volts,
            bound: false,
            resolution: ADC_DEFAULT_RESOLUTION,
            latched: SensorData::default(),
            conversions: 0,
        }
    }

    fn ensure_bound(&self) -> DriverResult<()> {
        if self.bound {
            Ok(())
        } else {
            Err(DriverError::InvalidState)
        }
    }
}

impl SensorDriver for SimAdc {
    fn init(&mut self, bus: Bus, _handle: u8) -> DriverResult<()> {
        if bus != Bus::None {
            return Err(DriverError::NotSupported);
        }
        self.bound = true;
        Ok(())
    }

    fn uninit(&mut self) -> DriverResult<()> {
        self.bound = false;
        self.resolution = ADC_DEFAULT_RESOLUTION;
        Ok(())
    }

    fn configuration_set(&mut self, config: &mut SensorConfig) -> DriverResult<()> {
        self.ensure_bound()?;
        self.resolution = adc_resolution(config.resolution, self.resolution);
        config.resolution = Setting::Value(self.resolution);
        // Conversions are triggered, never free-running
        config.samplerate = Setting::Min;
        config.scale = Setting::Value(ADC_FULL_SCALE.ceil() as u8);
        config.dsp_function = DspFunction::Last;
        config.dsp_parameter = 1;
        if config.mode == SensorMode::Continuous {
            config.mode = SensorMode::Single;
        }
        Ok(())
    }

    fn configuration_get(&mut self, config: &mut SensorConfig) -> DriverResult<()> {
        self.ensure_bound()?;
        config.resolution = Setting::Value(self.resolution);
        config.samplerate = Setting::Min;
        config.scale = Setting::Value(ADC_FULL_SCALE.ceil() as u8);
        config.dsp_function = DspFunction::Last;
        config.dsp_parameter = 1;
        config.mode = SensorMode::Sleep;
        Ok(())
    }

    fn mode_set(&mut self, mode: &mut SensorMode) -> DriverResult<()> {
        self.ensure_bound()?;
        match *mode {
            SensorMode::Sleep => Ok(()),
            SensorMode::Single => {
                self.conversions += 1;
                // Slow discharge so consecutive readings differ
                let volts = self.supply_volts - 0.0005 * self.conversions as f32;
                self.latched = SensorData {
                    timestamp: self.clock.now(),
                    value: quantize(volts, self.resolution),
                };
                *mode = SensorMode::Sleep;
                Ok(())
            }
            SensorMode::Continuous => Err(DriverError::NotSupported),
        }
    }

    fn data_get(&mut self, data: &mut SensorData) -> DriverResult<()> {
        self.ensure_bound()?;
        *data = self.latched;
        Ok(())
    }
}

/// MCU die temperature sensor
pub struct SimTemperature {
    clock: Clock,
    bound: bool,
    latched: SensorData,
    conversions: u32,
}

impl SimTemperature {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            bound: false,
            latched: SensorData::default(),
            conversions: 0,
        }
    }
}

impl SensorDriver for SimTemperature {
    fn init(&mut self, _bus: Bus, _handle: u8) -> DriverResult<()> {
        self.bound = true;
        Ok(())
    }

    fn uninit(&mut self) -> DriverResult<()> {
        self.bound = false;
        Ok(())
    }

    fn configuration_set(&mut self, config: &mut SensorConfig) -> DriverResult<()> {
        if !self.bound {
            return Err(DriverError::InvalidState);
        }
        // Fixed 0.25 C steps
        config.resolution = Setting::Value(10);
        config.samplerate = Setting::Min;
        config.scale = Setting::Default;
        config.dsp_function = DspFunction::Last;
        config.dsp_parameter = 1;
        Ok(())
    }

    fn configuration_get(&mut self, config: &mut SensorConfig) -> DriverResult<()> {
        *config = SensorConfig::default();
        self.configuration_set(config)
    }

    fn mode_set(&mut self, mode: &mut SensorMode) -> DriverResult<()> {
        if !self.bound {
            return Err(DriverError::InvalidState);
        }
        if *mode == SensorMode::Single {
            self.conversions += 1;
            self.latched = SensorData {
                timestamp: self.clock.now(),
                value: 21.0 + (self.conversions % 5) as f32 * 0.25,
            };
            *mode = SensorMode::Sleep;
        }
        Ok(())
    }

    fn data_get(&mut self, data: &mut SensorData) -> DriverResult<()> {
        if !self.bound {
            return Err(DriverError::InvalidState);
        }
        *data = self.latched;
        Ok(())
    }
}

pub struct SimRtc {
    clock: Clock,
    running: bool,
}

impl SimRtc {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            running: false,
        }
    }
}

impl Rtc for SimRtc {
    fn init(&mut self) -> DriverResult<()> {
        self.running = true;
        Ok(())
    }

    fn uninit(&mut self) -> DriverResult<()> {
        self.running = false;
        Ok(())
    }

    fn millis(&self) -> Timestamp {
        if self.running {
            self.clock.now()
        } else {
            Timestamp::ZERO
        }
    }
}

/// Watchdog that reports, instead of performing, a reset
#[derive(Default)]
pub struct SimWatchdog {
    interval: Option<Duration>,
    last_feed: Option<Instant>,
}

impl Watchdog for SimWatchdog {
    fn init(&mut self, interval_ms: u32) -> DriverResult<()> {
        if self.interval.is_some() {
            return Err(DriverError::InvalidState);
        }
        self.interval = Some(Duration::from_millis(u64::from(interval_ms)));
        self.last_feed = Some(Instant::now());
        Ok(())
    }

    fn feed(&mut self) {
        if let (Some(interval), Some(last)) = (self.interval, self.last_feed) {
            if last.elapsed() > interval {
                log::error!("watchdog starved for {:?}, target would reset", last.elapsed());
            }
        }
        self.last_feed = Some(Instant::now());
    }
}

#[derive(Default)]
pub struct SimPower {
    pub dcdc: bool,
}

impl Power for SimPower {
    fn dcdc_init(&mut self) -> DriverResult<()> {
        self.dcdc = true;
        log::debug!("dc/dc converter enabled");
        Ok(())
    }
}

#[derive(Default)]
pub struct SimNfc {
    up: bool,
    pending: Vec<String>,
    pub published: Vec<String>,
}

impl Nfc for SimNfc {
    fn init(&mut self) -> DriverResult<()> {
        self.up = true;
        Ok(())
    }

    fn uninit(&mut self) -> DriverResult<()> {
        self.up = false;
        self.published.clear();
        Ok(())
    }

    fn text_record_set(&mut self, text: &str) -> DriverResult<()> {
        if !self.up {
            return Err(DriverError::InvalidState);
        }
        self.pending.push(text.to_owned());
        Ok(())
    }

    fn data_commit(&mut self) -> DriverResult<()> {
        if !self.up {
            return Err(DriverError::InvalidState);
        }
        self.published = std::mem::take(&mut self.pending);
        log::info!("nfc tag: {:?}", self.published);
        Ok(())
    }
}

/// Output pin that logs level changes
pub struct SimPin {
    name: &'static str,
    high: Option<bool>,
}

impl SimPin {
    pub fn new(name: &'static str) -> Self {
        Self { name, high: None }
    }

    pub fn is_high(&self) -> Option<bool> {
        self.high
    }

    fn set(&mut self, high: bool) {
        if self.high != Some(high) {
            log::trace!("{} -> {}", self.name, if high { "high" } else { "low" });
        }
        self.high = Some(high);
    }
}

impl ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

/// Blocking delay on the calling thread
#[derive(Default)]
pub struct SimDelay;

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
