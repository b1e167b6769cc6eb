use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use beacon_core::{DriverError, Error};
use beacon_tasks::{chip_selects_init, AdvState, LedMap, LedRole, LedTask, RadioIndicator};

#[derive(Debug, Default)]
struct MockPin {
    high: Option<bool>,
    broken: bool,
}

impl ErrorType for MockPin {
    type Error = ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.broken {
            return Err(ErrorKind::Other);
        }
        self.high = Some(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.broken {
            return Err(ErrorKind::Other);
        }
        self.high = Some(true);
        Ok(())
    }
}

fn leds() -> LedTask<MockPin, 2> {
    LedTask::new([MockPin::default(), MockPin::default()], LedMap::RED_GREEN, true)
}

fn lit(task: &LedTask<MockPin, 2>) -> [bool; 2] {
    // Active low: a low pin is a lit LED
    task.pins().each_ref().map(|pin| pin.high == Some(false))
}

#[test]
fn test_init_turns_everything_off() {
    let mut task = leds();
    task.init().unwrap();
    assert_eq!(task.pins()[0].high, Some(true));
    assert_eq!(task.pins()[1].high, Some(true));
}

#[test]
fn test_roles_share_physical_leds() {
    let mut task = leds();
    task.init().unwrap();

    task.write(LedRole::Activity, true).unwrap();
    assert_eq!(lit(&task), [true, false]);
    task.write(LedRole::Red, false).unwrap();
    task.write(LedRole::StatusOk, true).unwrap();
    assert_eq!(lit(&task), [false, true]);

    task.write(LedRole::Green, false).unwrap();
    assert_eq!(lit(&task), [false, false]);
}

#[test]
fn test_radio_states_map_to_leds() {
    let mut task = leds();
    task.init().unwrap();

    task.radio_state(AdvState::Scanning);
    assert_eq!(lit(&task), [false, true]);
    task.radio_state(AdvState::Receiving);
    assert_eq!(lit(&task), [true, false]);
    // Transmitting keeps the receive indication
    task.radio_state(AdvState::Transmitting);
    assert_eq!(lit(&task), [true, false]);
    task.radio_state(AdvState::Idle);
    assert_eq!(lit(&task), [false, false]);
}

#[test]
fn test_missing_led_is_not_found() {
    let map = LedMap {
        red: 5,
        ..LedMap::RED_GREEN
    };
    let mut task = LedTask::new([MockPin::default(), MockPin::default()], map, false);
    assert_eq!(task.write(LedRole::Red, true), Err(Error::NotFound));
}

#[test]
fn test_chip_selects_driven_high() {
    let mut cs = [MockPin::default(), MockPin::default(), MockPin::default()];
    chip_selects_init(&mut cs).unwrap();
    assert!(cs.iter().all(|pin| pin.high == Some(true)));

    let mut cs = [
        MockPin::default(),
        MockPin {
            broken: true,
            ..MockPin::default()
        },
        MockPin::default(),
    ];
    assert_eq!(
        chip_selects_init(&mut cs),
        Err(Error::Driver(DriverError::Internal))
    );
    // Pins after the failing one are still driven
    assert_eq!(cs[2].high, Some(true));
}
