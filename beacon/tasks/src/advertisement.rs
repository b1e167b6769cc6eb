//! Radio relay state machine
//!
//! The beacon listens for advertisements and rebroadcasts each one it hears,
//! verbatim, under the sender's address:
//!
//! ```text
//! Idle -> Scanning -> Receiving -> Transmitting -> Scanning -> ...
//! ```
//!
//! Interrupt context only runs [`radio_irq`], which copies the driver event
//! into the queue. State changes and every driver call happen in the queued
//! handlers, on the main loop.

use core::fmt;

use beacon_core::{AppConfig, DriverError, DriverResult, Error, InitReport, Result, TASK_DATA_MAX_SIZE};
use beacon_hal::{Radio, RadioEvent, ScanResult};
use beacon_queue::Enqueue;

/// Relay state of the radio channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvState {
    /// Radio configured but neither scanning nor transmitting
    Idle,
    /// Receiver armed
    Scanning,
    /// A payload was received; its relay is queued
    Receiving,
    /// Relayed payload handed to the radio
    Transmitting,
    /// Plain advertising of the configured data
    Advertising,
}

impl fmt::Display for AdvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdvState::Idle => "idle",
            AdvState::Scanning => "scanning",
            AdvState::Receiving => "receiving",
            AdvState::Transmitting => "transmitting",
            AdvState::Advertising => "advertising",
        };
        f.write_str(name)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AdvState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            AdvState::Idle => defmt::write!(fmt, "Idle"),
            AdvState::Scanning => defmt::write!(fmt, "Scanning"),
            AdvState::Receiving => defmt::write!(fmt, "Receiving"),
            AdvState::Transmitting => defmt::write!(fmt, "Transmitting"),
            AdvState::Advertising => defmt::write!(fmt, "Advertising"),
        }
    }
}

/// Observer notified on every relay state change
pub trait RadioIndicator {
    fn radio_state(&mut self, state: AdvState);
}

/// Indicator that shows nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIndicator;

impl RadioIndicator for NoIndicator {
    fn radio_state(&mut self, _state: AdvState) {}
}

/// Application context that owns the relay and its indicator
///
/// Queued radio handlers are generic over this trait so the relay can live
/// inside a larger context next to the tasks it shares the loop with.
pub trait RelayContext {
    type Radio: Radio;
    type Indicator: RadioIndicator;

    fn relay_parts(&mut self) -> (&mut Advertisement<Self::Radio>, &mut Self::Indicator);
}

/// Relay counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Payloads handed to the radio
    pub relayed: u32,
    /// Payloads dropped because a relay was already in flight
    pub forfeited: u32,
    /// Relays the driver refused
    pub failed: u32,
}

/// Owner of the radio channel
pub struct Advertisement<R: Radio> {
    radio: R,
    state: AdvState,
    initialized: bool,
    tx_power_dbm: i8,
    stats: RelayStats,
}

impl<R: Radio> Advertisement<R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            state: AdvState::Idle,
            initialized: false,
            tx_power_dbm: 0,
            stats: RelayStats::default(),
        }
    }

    /// Configure tx power, manufacturer id, advertising interval and scan timing
    ///
    /// Every step is attempted; the report names the ones that failed. The
    /// channel is left `Idle`.
    pub fn init(&mut self, config: &AppConfig) -> InitReport {
        let mut report = InitReport::new("advertisement");

        let ready = report
            .record("advertising_init", self.radio.advertising_init().map_err(Error::from))
            .is_ok();

        let requested = config.advertising_power_dbm;
        let mut applied = requested;
        if report
            .record("tx_power_set", self.radio.tx_power_set(&mut applied).map_err(Error::from))
            .is_ok()
        {
            if applied != requested {
                log::warn!("tx power {} dBm requested, {} dBm applied", requested, applied);
            } else {
                log::info!("tx power {} dBm", applied);
            }
            self.tx_power_dbm = applied;
        }

        let _ = report.record(
            "manufacturer_id_set",
            self.radio
                .manufacturer_id_set(config.board.manufacturer_id)
                .map_err(Error::from),
        );
        let _ = report.record(
            "tx_interval_set",
            self.radio
                .tx_interval_set(config.advertising_interval_ms)
                .map_err(Error::from),
        );
        let _ = report.record(
            "scan_parameters_set",
            self.radio
                .scan_parameters_set(config.scan_interval_ms, config.scan_window_ms, config.scan_timeout_ms)
                .map_err(Error::from),
        );

        self.initialized = ready;
        self.state = AdvState::Idle;
        report
    }

    /// Release the radio
    pub fn uninit(&mut self) -> Result<()> {
        self.initialized = false;
        self.state = AdvState::Idle;
        self.radio.advertising_uninit().map_err(Error::from)
    }

    /// Begin plain advertising of the configured data
    pub fn start(&mut self, indicator: &mut impl RadioIndicator) -> Result<()> {
        if !self.initialized || self.state != AdvState::Idle {
            return Err(Error::InvalidState);
        }
        self.radio.advertising_start()?;
        self.set_state(AdvState::Advertising, indicator);
        Ok(())
    }

    /// Force the channel to `Idle`
    ///
    /// A driver reporting that nothing was active counts as success, so
    /// stopping twice is harmless.
    pub fn stop(&mut self, indicator: &mut impl RadioIndicator) -> Result<()> {
        let scan = if self.state == AdvState::Scanning {
            not_active_is_ok(self.radio.scan_stop())
        } else {
            Ok(())
        };
        let advertising = not_active_is_ok(self.radio.advertising_stop());
        self.set_state(AdvState::Idle, indicator);
        scan.and(advertising).map_err(Error::from)
    }

    /// Arm the receiver
    pub fn scan_start(&mut self, indicator: &mut impl RadioIndicator) -> Result<()> {
        if !self.initialized {
            return Err(Error::InvalidState);
        }
        match self.state {
            AdvState::Scanning => return Ok(()),
            AdvState::Receiving | AdvState::Advertising => return Err(Error::InvalidState),
            AdvState::Idle | AdvState::Transmitting => {}
        }
        self.radio.scan_start()?;
        self.set_state(AdvState::Scanning, indicator);
        Ok(())
    }

    /// React to a radio event, in main-loop context
    ///
    /// A received advertisement queues its relay and stops scanning; only one
    /// relay is in flight at a time, later receptions are forfeited until the
    /// radio reports the transmission complete.
    pub fn on_radio_event<C>(
        &mut self,
        event: RadioEvent,
        sink: &dyn Enqueue<C>,
        indicator: &mut impl RadioIndicator,
    ) -> Result<()>
    where
        C: RelayContext<Radio = R>,
    {
        match event {
            RadioEvent::Received(scan) => match self.state {
                AdvState::Scanning => {
                    let mut buf = [0u8; TASK_DATA_MAX_SIZE];
                    let len = scan.encode(&mut buf).ok_or(Error::DataSize)?;
                    sink.enqueue(repeat_task::<C>, &buf[..len])?;
                    log::debug!("received {} bytes from {} ({} dBm)", scan.data.len(), scan.address, scan.rssi);
                    if let Err(err) = self.radio.scan_stop() {
                        log::warn!("scan stop failed: {}", err);
                    }
                    self.set_state(AdvState::Receiving, indicator);
                    Ok(())
                }
                AdvState::Receiving | AdvState::Transmitting => {
                    self.stats.forfeited = self.stats.forfeited.wrapping_add(1);
                    log::warn!("relay in flight, payload from {} forfeited", scan.address);
                    Ok(())
                }
                state => {
                    log::debug!("reception ignored while {}", state);
                    Ok(())
                }
            },
            RadioEvent::Sent => {
                if self.state == AdvState::Transmitting {
                    self.rearm_scan(indicator)
                } else {
                    log::debug!("send complete while {}", self.state);
                    Ok(())
                }
            }
            RadioEvent::Other(code) => {
                log::debug!("unhandled radio event {}", code);
                Ok(())
            }
        }
    }

    /// Rebroadcast `scan` under its sender's address
    ///
    /// When the driver refuses the transmission the channel falls back to
    /// scanning.
    pub fn relay(&mut self, scan: &ScanResult, indicator: &mut impl RadioIndicator) -> Result<()> {
        if self.state != AdvState::Receiving {
            log::debug!("relay of {} dropped while {}", scan.address, self.state);
            return Err(Error::InvalidState);
        }
        let radio = &mut self.radio;
        let sent = radio
            .address_set(scan.address.to_u64())
            .and_then(|()| radio.send_raw(&scan.data));
        match sent {
            Ok(()) => {
                self.stats.relayed = self.stats.relayed.wrapping_add(1);
                self.set_state(AdvState::Transmitting, indicator);
                Ok(())
            }
            Err(err) => {
                self.stats.failed = self.stats.failed.wrapping_add(1);
                log::error!("relay of {} failed: {}", scan.address, err);
                self.rearm_scan(indicator)?;
                Err(err.into())
            }
        }
    }

    pub fn state(&self) -> AdvState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Tx power the driver applied at init
    pub fn tx_power_dbm(&self) -> i8 {
        self.tx_power_dbm
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    fn rearm_scan(&mut self, indicator: &mut impl RadioIndicator) -> Result<()> {
        match self.radio.scan_start() {
            Ok(()) => {
                self.set_state(AdvState::Scanning, indicator);
                Ok(())
            }
            Err(err) => {
                log::error!("scan re-arm failed: {}", err);
                self.set_state(AdvState::Idle, indicator);
                Err(err.into())
            }
        }
    }

    fn set_state(&mut self, state: AdvState, indicator: &mut impl RadioIndicator) {
        if self.state != state {
            log::trace!("radio {} -> {}", self.state, state);
        }
        self.state = state;
        indicator.radio_state(state);
    }
}

fn not_active_is_ok(result: DriverResult<()>) -> DriverResult<()> {
    match result {
        Err(DriverError::InvalidState) => Ok(()),
        other => other,
    }
}

/// Interrupt glue: copy a driver event into the queue
///
/// The only radio code that runs in interrupt context. A full queue drops the
/// event and reports it; it never blocks.
pub fn radio_irq<C: RelayContext>(event: RadioEvent, sink: &dyn Enqueue<C>) -> Result<()> {
    match event {
        RadioEvent::Received(scan) => {
            let mut buf = [0u8; TASK_DATA_MAX_SIZE];
            let len = scan.encode(&mut buf).ok_or(Error::DataSize)?;
            sink.enqueue(received_task::<C>, &buf[..len])
        }
        RadioEvent::Sent => sink.enqueue(sent_task::<C>, &[]),
        RadioEvent::Other(code) => sink.enqueue(other_task::<C>, &[code]),
    }
}

fn received_task<C: RelayContext>(ctx: &mut C, sink: &dyn Enqueue<C>, payload: &[u8]) {
    let Some(scan) = ScanResult::decode(payload) else {
        log::warn!("malformed scan result dropped");
        return;
    };
    dispatch(ctx, sink, RadioEvent::Received(scan));
}

fn sent_task<C: RelayContext>(ctx: &mut C, sink: &dyn Enqueue<C>, _payload: &[u8]) {
    dispatch(ctx, sink, RadioEvent::Sent);
}

fn other_task<C: RelayContext>(ctx: &mut C, sink: &dyn Enqueue<C>, payload: &[u8]) {
    dispatch(ctx, sink, RadioEvent::Other(payload.first().copied().unwrap_or(0)));
}

fn dispatch<C: RelayContext>(ctx: &mut C, sink: &dyn Enqueue<C>, event: RadioEvent) {
    let (adv, indicator) = ctx.relay_parts();
    if let Err(err) = adv.on_radio_event(event, sink, indicator) {
        log::error!("radio event handling failed: {}", err);
    }
}

/// Queued relay: set the sender's address and transmit its raw payload
pub fn repeat_task<C: RelayContext>(ctx: &mut C, _sink: &dyn Enqueue<C>, payload: &[u8]) {
    let Some(scan) = ScanResult::decode(payload) else {
        log::warn!("malformed relay payload dropped");
        return;
    };
    let (adv, indicator) = ctx.relay_parts();
    // Failures are logged by the relay and the channel is already re-armed
    let _ = adv.relay(&scan, indicator);
}
