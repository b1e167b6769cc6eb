//! beacon-sim: run the relay beacon firmware against simulated hardware

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use clap::Parser;
use log::LevelFilter;

use beacon_core::{AppConfig, Modules};
use beacon_posix::sim::{self, Air, Clock};
use beacon_posix::{logger, App, CondvarIdle, SimBoard, SimOptions, Wakeup};
use beacon_queue::EventQueue;
use beacon_sched::{Scheduler, TimerWheel};

static QUEUE: EventQueue<App> = EventQueue::new();
static TIMERS: TimerWheel<App> = TimerWheel::new();

#[derive(Parser, Debug)]
#[command(author, version, about = "Relay beacon firmware on simulated hardware")]
struct Opts {
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    log_level: LevelFilter,

    /// Interval between overheard advertisements
    #[arg(long, default_value_t = 500, value_name = "MS")]
    rx_interval_ms: u64,

    /// Battery sampling interval
    #[arg(long, default_value_t = beacon_core::ADC_SAMPLE_INTERVAL_MS, value_name = "MS")]
    adc_interval_ms: u32,

    /// Die temperature sampling interval
    #[arg(long, default_value_t = beacon_core::ENVIRONMENTAL_SAMPLE_INTERVAL_MS, value_name = "MS")]
    temperature_interval_ms: u32,

    /// Simulated battery voltage
    #[arg(long, default_value_t = 3.0, value_name = "VOLTS")]
    supply_volts: f32,

    /// Run the MCU self-tests before bring-up
    #[arg(long)]
    self_tests: bool,

    /// Board without an NFC antenna
    #[arg(long)]
    no_nfc: bool,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long, value_name = "SECS")]
    duration: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let config = AppConfig::builder()
        .log_level(opts.log_level)
        .adc_sample_interval_ms(opts.adc_interval_ms)
        .environmental_sample_interval_ms(opts.temperature_interval_ms)
        .modules(Modules {
            self_tests: opts.self_tests,
            ..Modules::DEFAULT
        })
        .build();
    logger::init(config.log_level).context("installing logger")?;

    let clock = Clock::start();
    let air = Air::default();
    let wakeup = Arc::new(Wakeup::new());
    let options = SimOptions {
        supply_volts: opts.supply_volts,
        nfc_fitted: !opts.no_nfc,
    };

    let mut beacon = App::new(config, SimBoard::peripherals(clock, Arc::clone(&air), &options));
    let mut scheduler = Scheduler::new(&QUEUE, CondvarIdle::new(Arc::clone(&wakeup)));

    beacon
        .boot(&TIMERS, scheduler.idle_mut())
        .map_err(|failure| anyhow!("bring-up failed: {}", failure))?;

    beacon_posix::start();
    {
        let wakeup = Arc::clone(&wakeup);
        ctrlc::set_handler(move || {
            beacon_posix::stop();
            wakeup.notify();
        })
        .context("installing Ctrl-C handler")?;
    }

    let radio = sim::spawn_radio(
        Arc::clone(&air),
        Arc::clone(&wakeup),
        &QUEUE,
        Duration::from_millis(opts.rx_interval_ms),
    );
    let ticker = sim::spawn_ticker(clock, Arc::clone(&wakeup), &TIMERS, &QUEUE);

    let deadline = opts.duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    while beacon_posix::is_running() {
        beacon.step(&mut scheduler);
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            beacon_posix::stop();
        }
    }

    for handle in [radio, ticker] {
        handle.join().map_err(|_| anyhow!("interrupt thread panicked"))?;
    }

    let queue = QUEUE.stats();
    let relay = beacon.advertisement().stats();
    log::info!(
        "relayed {} (forfeited {}, failed {}), queue high water {}/{}, dropped {}",
        relay.relayed,
        relay.forfeited,
        relay.failed,
        queue.high_water,
        queue.capacity,
        queue.dropped
    );
    if let Some(mv) = beacon.adc().battery_millivolts() {
        log::info!("last battery reading {} mV", mv);
    }
    log::logger().flush();
    Ok(())
}
