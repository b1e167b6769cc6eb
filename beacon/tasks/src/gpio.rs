//! Board GPIO bring-up

use beacon_core::{Error, Result};
use beacon_hal::{digital_error, OutputPin};

/// Drive every SPI chip select high so no peripheral listens on the bus
///
/// All pins are attempted; the first failure is returned.
pub fn chip_selects_init<P: OutputPin>(chip_selects: &mut [P]) -> Result<()> {
    let mut status = Ok(());
    for (index, cs) in chip_selects.iter_mut().enumerate() {
        if let Err(err) = cs.set_high() {
            let err = Error::Driver(digital_error(err));
            log::error!("chip select {}: {}", index, err);
            if status.is_ok() {
                status = Err(err);
            }
        }
    }
    status
}
