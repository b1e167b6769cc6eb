use beacon_core::{AppConfig, DriverError, DriverResult, Error};
use beacon_hal::{Address, Radio, RadioEvent, ScanResult};
use beacon_queue::EventQueue;
use beacon_tasks::{radio_irq, AdvState, Advertisement, RadioIndicator, RelayContext};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    AdvertisingInit,
    AdvertisingUninit,
    TxPower(i8),
    ManufacturerId(u16),
    TxInterval(u32),
    ScanParameters(u32, u32, u32),
    AdvertisingStart,
    AdvertisingStop,
    ScanStart,
    ScanStop,
    AddressSet(u64),
    SendRaw(Vec<u8>),
}

#[derive(Default)]
struct MockRadio {
    calls: Vec<Call>,
    scanning: bool,
    advertising: bool,
    max_power: Option<i8>,
    fail_manufacturer_id: bool,
    fail_send: bool,
}

impl MockRadio {
    fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }
}

impl Radio for MockRadio {
    fn advertising_init(&mut self) -> DriverResult<()> {
        self.calls.push(Call::AdvertisingInit);
        Ok(())
    }

    fn advertising_uninit(&mut self) -> DriverResult<()> {
        self.calls.push(Call::AdvertisingUninit);
        Ok(())
    }

    fn tx_power_set(&mut self, dbm: &mut i8) -> DriverResult<()> {
        if let Some(max) = self.max_power {
            *dbm = (*dbm).min(max);
        }
        self.calls.push(Call::TxPower(*dbm));
        Ok(())
    }

    fn manufacturer_id_set(&mut self, id: u16) -> DriverResult<()> {
        self.calls.push(Call::ManufacturerId(id));
        if self.fail_manufacturer_id {
            return Err(DriverError::InvalidParam);
        }
        Ok(())
    }

    fn tx_interval_set(&mut self, interval_ms: u32) -> DriverResult<()> {
        self.calls.push(Call::TxInterval(interval_ms));
        Ok(())
    }

    fn scan_parameters_set(&mut self, interval_ms: u32, window_ms: u32, timeout_ms: u32) -> DriverResult<()> {
        self.calls.push(Call::ScanParameters(interval_ms, window_ms, timeout_ms));
        Ok(())
    }

    fn advertising_start(&mut self) -> DriverResult<()> {
        self.calls.push(Call::AdvertisingStart);
        self.advertising = true;
        Ok(())
    }

    fn advertising_stop(&mut self) -> DriverResult<()> {
        self.calls.push(Call::AdvertisingStop);
        if !std::mem::replace(&mut self.advertising, false) {
            return Err(DriverError::InvalidState);
        }
        Ok(())
    }

    fn scan_start(&mut self) -> DriverResult<()> {
        self.calls.push(Call::ScanStart);
        self.scanning = true;
        Ok(())
    }

    fn scan_stop(&mut self) -> DriverResult<()> {
        self.calls.push(Call::ScanStop);
        if !std::mem::replace(&mut self.scanning, false) {
            return Err(DriverError::InvalidState);
        }
        Ok(())
    }

    fn address_set(&mut self, address: u64) -> DriverResult<()> {
        self.calls.push(Call::AddressSet(address));
        Ok(())
    }

    fn send_raw(&mut self, data: &[u8]) -> DriverResult<()> {
        self.calls.push(Call::SendRaw(data.to_vec()));
        if self.fail_send {
            return Err(DriverError::Busy);
        }
        Ok(())
    }
}

#[derive(Default)]
struct Indicator {
    states: Vec<AdvState>,
}

impl RadioIndicator for Indicator {
    fn radio_state(&mut self, state: AdvState) {
        self.states.push(state);
    }
}

struct Relay {
    adv: Advertisement<MockRadio>,
    leds: Indicator,
}

impl RelayContext for Relay {
    type Radio = MockRadio;
    type Indicator = Indicator;

    fn relay_parts(&mut self) -> (&mut Advertisement<MockRadio>, &mut Indicator) {
        (&mut self.adv, &mut self.leds)
    }
}

fn relay_with(radio: MockRadio) -> Relay {
    let mut relay = Relay {
        adv: Advertisement::new(radio),
        leds: Indicator::default(),
    };
    let report = relay.adv.init(&AppConfig::default());
    assert!(report.is_ok());
    relay.adv.radio_mut().take_calls();
    relay
}

fn relay() -> Relay {
    relay_with(MockRadio::default())
}

fn scan(address: [u8; 6], data: &[u8]) -> ScanResult {
    ScanResult::new(Address(address), -60, data).unwrap()
}

const SENDER: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

#[test]
fn test_init_configures_radio_in_order() {
    let config = AppConfig::builder().advertising_power_dbm(8).build();
    let mut adv = Advertisement::new(MockRadio {
        max_power: Some(4),
        ..MockRadio::default()
    });

    let report = adv.init(&config);
    assert!(report.is_ok());
    assert_eq!(report.steps().len(), 5);
    assert_eq!(adv.state(), AdvState::Idle);
    assert_eq!(adv.tx_power_dbm(), 4);
    assert_eq!(
        adv.radio().calls,
        vec![
            Call::AdvertisingInit,
            Call::TxPower(4),
            Call::ManufacturerId(0x0499),
            Call::TxInterval(100),
            Call::ScanParameters(3500, 3500, 10_500),
        ]
    );
}

#[test]
fn test_init_failure_names_step() {
    let mut adv = Advertisement::new(MockRadio {
        fail_manufacturer_id: true,
        ..MockRadio::default()
    });

    let report = adv.init(&AppConfig::default());
    // Later steps still run
    assert_eq!(report.steps().len(), 5);
    let failure = report.finish().unwrap_err();
    assert_eq!(failure.step, "manufacturer_id_set");
    assert_eq!(failure.error, Error::Driver(DriverError::InvalidParam));
}

#[test]
fn test_scan_start_requires_init() {
    let mut adv = Advertisement::new(MockRadio::default());
    let mut leds = Indicator::default();
    assert_eq!(adv.scan_start(&mut leds), Err(Error::InvalidState));
    assert!(adv.radio().calls.is_empty());
}

#[test]
fn test_receive_queues_one_relay_and_stops_scanning() {
    let mut relay = relay();
    let queue: EventQueue<Relay> = EventQueue::new();

    relay.adv.scan_start(&mut relay.leds).unwrap();
    let (adv, leds) = relay.relay_parts();
    adv.on_radio_event::<Relay>(RadioEvent::Received(scan(SENDER, &[0x02, 0x01, 0x06])), &queue, leds)
        .unwrap();

    assert_eq!(queue.len(), 1);
    assert_eq!(relay.adv.state(), AdvState::Receiving);
    assert!(!relay.adv.radio().scanning);
    assert_eq!(relay.adv.radio_mut().take_calls(), vec![Call::ScanStart, Call::ScanStop]);
    assert_eq!(relay.leds.states, vec![AdvState::Scanning, AdvState::Receiving]);
}

#[test]
fn test_relay_end_to_end() {
    let mut relay = relay();
    let queue: EventQueue<Relay> = EventQueue::new();

    relay.adv.scan_start(&mut relay.leds).unwrap();
    relay.adv.radio_mut().take_calls();

    radio_irq::<Relay>(RadioEvent::Received(scan(SENDER, &[0x02, 0x01, 0x06])), &queue).unwrap();
    queue.execute_pending(&mut relay);

    assert_eq!(
        relay.adv.radio_mut().take_calls(),
        vec![
            Call::ScanStop,
            Call::AddressSet(0xAABB_CCDD_EEFF),
            Call::SendRaw(vec![0x02, 0x01, 0x06]),
        ]
    );
    assert_eq!(relay.adv.state(), AdvState::Transmitting);
    assert!(!relay.adv.radio().scanning);

    // Scanning resumes only once the radio reports the send complete
    radio_irq::<Relay>(RadioEvent::Sent, &queue).unwrap();
    queue.execute_pending(&mut relay);

    assert_eq!(relay.adv.radio_mut().take_calls(), vec![Call::ScanStart]);
    assert_eq!(relay.adv.state(), AdvState::Scanning);
    assert_eq!(relay.adv.stats().relayed, 1);
    assert_eq!(
        relay.leds.states,
        vec![
            AdvState::Scanning,
            AdvState::Receiving,
            AdvState::Transmitting,
            AdvState::Scanning,
        ]
    );
}

#[test]
fn test_second_receive_is_forfeited() {
    let mut relay = relay();
    let queue: EventQueue<Relay> = EventQueue::new();

    relay.adv.scan_start(&mut relay.leds).unwrap();
    radio_irq::<Relay>(RadioEvent::Received(scan(SENDER, &[0x01])), &queue).unwrap();
    radio_irq::<Relay>(RadioEvent::Received(scan([1, 2, 3, 4, 5, 6], &[0x02])), &queue).unwrap();
    queue.execute_pending(&mut relay);

    let sends: Vec<Call> = relay
        .adv
        .radio_mut()
        .take_calls()
        .into_iter()
        .filter(|call| matches!(call, Call::SendRaw(_) | Call::AddressSet(_)))
        .collect();
    assert_eq!(sends, vec![Call::AddressSet(0xAABB_CCDD_EEFF), Call::SendRaw(vec![0x01])]);
    assert_eq!(relay.adv.stats().forfeited, 1);
}

#[test]
fn test_failed_send_falls_back_to_scanning() {
    let mut relay = relay_with(MockRadio {
        fail_send: true,
        ..MockRadio::default()
    });
    let queue: EventQueue<Relay> = EventQueue::new();

    relay.adv.scan_start(&mut relay.leds).unwrap();
    radio_irq::<Relay>(RadioEvent::Received(scan(SENDER, &[0x02, 0x01, 0x06])), &queue).unwrap();
    queue.execute_pending(&mut relay);

    assert_eq!(relay.adv.state(), AdvState::Scanning);
    assert!(relay.adv.radio().scanning);
    assert_eq!(relay.adv.stats().failed, 1);
    assert_eq!(relay.adv.stats().relayed, 0);
}

#[test]
fn test_stop_is_idempotent() {
    let mut relay = relay();

    assert_eq!(relay.adv.stop(&mut relay.leds), Ok(()));
    assert_eq!(relay.adv.stop(&mut relay.leds), Ok(()));
    assert_eq!(relay.adv.state(), AdvState::Idle);

    relay.adv.scan_start(&mut relay.leds).unwrap();
    assert_eq!(relay.adv.stop(&mut relay.leds), Ok(()));
    assert!(!relay.adv.radio().scanning);
    assert_eq!(relay.adv.state(), AdvState::Idle);
}

#[test]
fn test_advertising_excludes_scanning() {
    let mut relay = relay();

    relay.adv.start(&mut relay.leds).unwrap();
    assert_eq!(relay.adv.state(), AdvState::Advertising);
    assert_eq!(relay.adv.scan_start(&mut relay.leds), Err(Error::InvalidState));

    relay.adv.stop(&mut relay.leds).unwrap();
    relay.adv.scan_start(&mut relay.leds).unwrap();
    assert_eq!(relay.adv.state(), AdvState::Scanning);

    relay.adv.uninit().unwrap();
    assert!(!relay.adv.is_initialized());
    assert_eq!(relay.adv.scan_start(&mut relay.leds), Err(Error::InvalidState));
}

#[test]
fn test_scan_start_while_transmitting_rearms_receiver() {
    let mut relay = relay();
    let queue: EventQueue<Relay> = EventQueue::new();

    relay.adv.scan_start(&mut relay.leds).unwrap();
    radio_irq::<Relay>(RadioEvent::Received(scan(SENDER, &[0x02, 0x01, 0x06])), &queue).unwrap();
    queue.execute_pending(&mut relay);
    assert_eq!(relay.adv.state(), AdvState::Transmitting);
    relay.adv.radio_mut().take_calls();

    relay.adv.scan_start(&mut relay.leds).unwrap();
    assert_eq!(relay.adv.state(), AdvState::Scanning);
    assert!(relay.adv.radio().scanning);
    assert_eq!(relay.adv.radio_mut().take_calls(), vec![Call::ScanStart]);

    // A late completion no longer changes anything
    radio_irq::<Relay>(RadioEvent::Sent, &queue).unwrap();
    queue.execute_pending(&mut relay);
    assert_eq!(relay.adv.state(), AdvState::Scanning);
    assert!(relay.adv.radio_mut().take_calls().is_empty());
}

#[test]
fn test_stop_discards_queued_relay() {
    let mut relay = relay();
    let queue: EventQueue<Relay> = EventQueue::new();

    relay.adv.scan_start(&mut relay.leds).unwrap();
    radio_irq::<Relay>(RadioEvent::Received(scan(SENDER, &[0x11])), &queue).unwrap();

    // Decode the reception only; its relay stays queued
    let received = queue.drain_one().unwrap();
    received.run(&mut relay, &queue);
    assert_eq!(relay.adv.state(), AdvState::Receiving);
    assert_eq!(queue.len(), 1);

    relay.adv.stop(&mut relay.leds).unwrap();
    assert_eq!(relay.adv.state(), AdvState::Idle);
    relay.adv.scan_start(&mut relay.leds).unwrap();

    queue.execute_pending(&mut relay);
    assert_eq!(relay.adv.state(), AdvState::Scanning);
    assert_eq!(relay.adv.stats().relayed, 0);

    radio_irq::<Relay>(RadioEvent::Received(scan([1, 2, 3, 4, 5, 6], &[0x22])), &queue).unwrap();
    queue.execute_pending(&mut relay);

    let sends: Vec<Call> = relay
        .adv
        .radio_mut()
        .take_calls()
        .into_iter()
        .filter(|call| matches!(call, Call::SendRaw(_)))
        .collect();
    assert_eq!(sends, vec![Call::SendRaw(vec![0x22])]);
    assert_eq!(relay.adv.state(), AdvState::Transmitting);
    assert_eq!(relay.adv.stats().relayed, 1);
}

#[test]
fn test_init_applies_configured_scan_timing() {
    let config = AppConfig::builder().scan_interval_ms(1000).build();
    let mut adv = Advertisement::new(MockRadio::default());

    assert!(adv.init(&config).is_ok());
    assert_eq!(adv.radio().calls.last(), Some(&Call::ScanParameters(1000, 1000, 3000)));
}
