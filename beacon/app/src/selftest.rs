//! MCU-only self-tests
//!
//! These expect the peripheral under test to be uninitialised and leave it
//! uninitialised. Production images keep them disabled.

use beacon_core::{Error, InitReport, Result};
use beacon_hal::{SensorData, SensorDriver};
use beacon_tasks::SensorTask;

fn expect_err(result: Result<()>, expected: Error) -> Result<()> {
    match result {
        Err(err) if err == expected => Ok(()),
        Err(err) => Err(err),
        Ok(()) => Err(Error::Fatal),
    }
}

/// Exercise the sensor task contract against a fresh driver
///
/// Checks argument and state validation, then one full conversion.
pub fn run_adc<D: SensorDriver>(adc: &mut SensorTask<D>) -> InitReport {
    let mut report = InitReport::new("selftest_adc");
    let mut data = SensorData::default();

    let _ = report.record(
        "data_get_before_init",
        expect_err(adc.data_get(Some(&mut data)), Error::InvalidState),
    );
    let _ = report.record("sample_before_init", expect_err(adc.sample(), Error::InvalidState));

    if report.record("init", adc.init()).is_ok() {
        let _ = report.record("data_get_null", expect_err(adc.data_get(None), Error::NullArgument));
        let _ = report.record("sample", adc.sample());
        let _ = report.record("data_get", adc.data_get(Some(&mut data)));
        let _ = report.record("uninit", adc.uninit());
    }

    if report.is_ok() {
        log::info!("adc self-test passed, sample {}", data.value);
    } else {
        log::error!("adc self-test failed");
    }
    report
}
