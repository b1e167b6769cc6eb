//! Bring-up sequence and main loop

use heapless::Vec;

use beacon_core::{AppConfig, Error, InitFailure, InitReport, Result, TimerMode, Timestamp};
use beacon_hal::{DelayNs, Power, Rtc, Watchdog};
use beacon_queue::Handler;
use beacon_sched::{Idle, Scheduler, TimerWheel};
use beacon_tasks::adc::battery_sample_task;
use beacon_tasks::environmental::temperature_sample_task;
use beacon_tasks::{
    chip_selects_init, AdcTask, Advertisement, EnvironmentalTask, LedRole, LedTask, NfcTask,
    RelayContext,
};

use crate::board::{Board, Peripherals, MAX_CHIP_SELECTS};
use crate::selftest;

type BootResult = core::result::Result<(), InitFailure>;

fn periodic<C, const T: usize>(
    timers: &TimerWheel<C, T>,
    handler: Handler<C>,
    interval_ms: u32,
    now: Timestamp,
) -> Result<()> {
    let id = timers.create(handler, TimerMode::Periodic)?;
    timers.start(id, interval_ms, now)
}

/// Application context handed to every queued handler
///
/// Owns every task and driver; handlers borrow the part they need.
pub struct Beacon<B: Board, const L: usize> {
    config: AppConfig,
    advertisement: Advertisement<B::Radio>,
    leds: LedTask<B::Led, L>,
    adc: AdcTask<B::Adc>,
    environmental: EnvironmentalTask<B::Temperature>,
    nfc: Option<NfcTask<B::Nfc>>,
    rtc: B::Rtc,
    watchdog: B::Watchdog,
    power: B::Power,
    chip_selects: Vec<B::ChipSelect, MAX_CHIP_SELECTS>,
    delay: B::Delay,
    self_test_passed: Option<bool>,
}

impl<B: Board, const L: usize> Beacon<B, L> {
    pub fn new(config: AppConfig, peripherals: Peripherals<B, L>) -> Self {
        let active_low = config.board.leds_active_low;
        Self {
            advertisement: Advertisement::new(peripherals.radio),
            leds: LedTask::new(peripherals.leds, peripherals.led_map, active_low),
            adc: AdcTask::new(peripherals.adc),
            environmental: EnvironmentalTask::new(peripherals.temperature),
            nfc: peripherals.nfc.map(NfcTask::new),
            rtc: peripherals.rtc,
            watchdog: peripherals.watchdog,
            power: peripherals.power,
            chip_selects: peripherals.chip_selects,
            delay: peripherals.delay,
            self_test_passed: None,
            config,
        }
    }

    /// Bring the beacon up and start scanning
    ///
    /// Groups run in order; the first group with a failed step stops
    /// bring-up, leaves the LEDs dark and is returned. The status-OK LED is
    /// only lit when every step succeeded.
    pub fn boot<const T: usize>(&mut self, timers: &TimerWheel<Self, T>, idle: &mut impl Idle) -> BootResult {
        log::info!("{} starting on {}", self.config.fw_version, self.config.board.name);

        if self.config.modules.self_tests {
            self.run_self_tests();
        }

        let result = self.init_mcu(timers, idle).and_then(|()| {
            self.write_led(LedRole::Activity, true);
            self.init_comms()
        });
        self.write_led(LedRole::Activity, false);

        if let Err(failure) = result {
            log::error!("bring-up stopped: {}", failure);
            let _ = self.leds.init();
            return Err(failure);
        }

        self.write_led(LedRole::StatusOk, true);
        self.delay.delay_ms(self.config.status_ok_display_ms);
        self.write_led(LedRole::StatusOk, false);

        if self.config.modules.advertising {
            let mut report: InitReport = InitReport::new("start");
            let (adv, leds) = self.relay_parts();
            let _ = report.record("scan_start", adv.scan_start(leds));
            report.finish()?;
        }
        log::info!("bring-up complete");
        Ok(())
    }

    /// One main-loop iteration: run pending events, feed the watchdog, sleep
    pub fn step<const Q: usize, const N: usize>(&mut self, scheduler: &mut Scheduler<'_, Self, impl Idle, Q, N>) -> usize {
        let executed = scheduler.execute(self);
        if self.config.modules.watchdog {
            self.watchdog.feed();
        }
        scheduler.wait();
        executed
    }

    /// Main loop; never returns
    pub fn run<const Q: usize, const N: usize>(&mut self, scheduler: &mut Scheduler<'_, Self, impl Idle, Q, N>) -> ! {
        loop {
            self.step(scheduler);
        }
    }

    fn run_self_tests(&mut self) {
        if let Err(err) = self.rtc.init() {
            log::warn!("self-test clock: {}", err);
        }
        let report = selftest::run_adc(&mut self.adc);
        self.self_test_passed = Some(report.is_ok());
        self.delay.delay_ms(self.config.self_test_settle_ms);
        if let Err(err) = self.rtc.uninit() {
            log::warn!("self-test clock: {}", err);
        }
    }

    fn init_mcu<const T: usize>(&mut self, timers: &TimerWheel<Self, T>, idle: &mut impl Idle) -> BootResult {
        let modules = self.config.modules;
        let mut report: InitReport<12> = InitReport::new("mcu");

        if modules.watchdog {
            let _ = report.record(
                "watchdog",
                self.watchdog.init(self.config.watchdog_interval_ms).map_err(Error::from),
            );
        }
        if modules.gpio {
            let _ = report.record("gpio", chip_selects_init(&mut self.chip_selects));
        }
        let _ = report.record("leds", self.leds.init());

        let clock = report.record("rtc", self.rtc.init().map_err(Error::from));
        if clock.is_ok() {
            let now = self.rtc.millis();
            if modules.adc {
                let battery = periodic(
                    timers,
                    battery_sample_task::<Self, B::Adc>,
                    self.config.adc_sample_interval_ms,
                    now,
                );
                let _ = report.record("battery_timer", battery);
            }
            if modules.environmental_mcu {
                let temperature = periodic(
                    timers,
                    temperature_sample_task::<Self, B::Temperature>,
                    self.config.environmental_sample_interval_ms,
                    now,
                );
                let _ = report.record("environmental_timer", temperature);
            }
        }
        idle.low_power_enable(modules.low_power_yield);

        if modules.power {
            let _ = report.record("dcdc", self.power.dcdc_init().map_err(Error::from));
        }
        if modules.adc {
            let _ = report.record("adc_init", self.adc.init());
        }
        if modules.environmental_mcu {
            let _ = report.record("environmental_init", self.environmental.init());
        }
        report.finish()
    }

    fn init_comms(&mut self) -> BootResult {
        if self.config.nfc_enabled() {
            match self.nfc.as_mut() {
                Some(nfc) => nfc.init(self.config.fw_version).finish()?,
                None => log::warn!("nfc enabled but not fitted"),
            }
        }
        if self.config.modules.advertising {
            self.advertisement.init(&self.config).finish()?;
        }
        Ok(())
    }

    fn write_led(&mut self, role: LedRole, on: bool) {
        if let Err(err) = self.leds.write(role, on) {
            log::warn!("led {:?}: {}", role, err);
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn advertisement(&self) -> &Advertisement<B::Radio> {
        &self.advertisement
    }

    pub fn leds(&self) -> &LedTask<B::Led, L> {
        &self.leds
    }

    pub fn adc(&self) -> &AdcTask<B::Adc> {
        &self.adc
    }

    pub fn environmental(&self) -> &EnvironmentalTask<B::Temperature> {
        &self.environmental
    }

    pub fn nfc(&self) -> Option<&NfcTask<B::Nfc>> {
        self.nfc.as_ref()
    }

    pub fn rtc(&self) -> &B::Rtc {
        &self.rtc
    }

    pub fn watchdog(&self) -> &B::Watchdog {
        &self.watchdog
    }

    pub fn delay(&self) -> &B::Delay {
        &self.delay
    }

    /// Outcome of the boot-time self-tests, when they ran
    pub fn self_test_passed(&self) -> Option<bool> {
        self.self_test_passed
    }
}

impl<B: Board, const L: usize> RelayContext for Beacon<B, L> {
    type Radio = B::Radio;
    type Indicator = LedTask<B::Led, L>;

    fn relay_parts(&mut self) -> (&mut Advertisement<B::Radio>, &mut LedTask<B::Led, L>) {
        (&mut self.advertisement, &mut self.leds)
    }
}

impl<B: Board, const L: usize> AsMut<AdcTask<B::Adc>> for Beacon<B, L> {
    fn as_mut(&mut self) -> &mut AdcTask<B::Adc> {
        &mut self.adc
    }
}

impl<B: Board, const L: usize> AsMut<EnvironmentalTask<B::Temperature>> for Beacon<B, L> {
    fn as_mut(&mut self) -> &mut EnvironmentalTask<B::Temperature> {
        &mut self.environmental
    }
}
