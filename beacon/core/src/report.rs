//! Ordered results of multi-step initialisation sequences

use core::fmt;
use heapless::Vec;

use crate::{Error, Result};

/// Default number of steps an init report can hold
pub const DEFAULT_REPORT_STEPS: usize = 8;

/// Outcome of a single initialisation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: &'static str,
    pub result: Result<()>,
}

/// Ordered collection of per-step results
///
/// Every step of a bring-up sequence is attempted and recorded in order, so a
/// failure report names the step that failed instead of a merged status code.
#[derive(Debug, Clone)]
pub struct InitReport<const N: usize = DEFAULT_REPORT_STEPS> {
    group: &'static str,
    steps: Vec<StepOutcome, N>,
    overflow: usize,
}

impl<const N: usize> InitReport<N> {
    /// Create an empty report for a named group of steps
    pub const fn new(group: &'static str) -> Self {
        Self {
            group,
            steps: Vec::new(),
            overflow: 0,
        }
    }

    /// Name of the group this report covers
    pub fn group(&self) -> &'static str {
        self.group
    }

    /// Record the result of a step and return it unchanged
    pub fn record<T>(&mut self, step: &'static str, result: Result<T>) -> Result<T> {
        let outcome = StepOutcome {
            step,
            result: result.as_ref().map(|_| ()).map_err(|e| *e),
        };
        if let Err(err) = outcome.result {
            log::error!("{}: step '{}' failed: {}", self.group, step, err);
        }
        if self.steps.push(outcome).is_err() {
            self.overflow += 1;
        }
        result
    }

    /// All recorded steps in execution order
    pub fn steps(&self) -> &[StepOutcome] {
        &self.steps
    }

    /// Check if every recorded step succeeded
    pub fn is_ok(&self) -> bool {
        self.steps.iter().all(|s| s.result.is_ok())
    }

    /// Iterate over failed steps
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> + '_ {
        self.steps.iter().filter(|s| s.result.is_err())
    }

    /// First failed step, if any
    pub fn first_failure(&self) -> Option<InitFailure> {
        let failures = self.failures().count();
        self.failures().next().and_then(|s| match s.result {
            Err(error) => Some(InitFailure {
                group: self.group,
                step: s.step,
                error,
                failures,
            }),
            Ok(()) => None,
        })
    }

    /// Close the report: `Ok` when all steps passed, otherwise the first failure
    pub fn finish(&self) -> core::result::Result<(), InitFailure> {
        match self.first_failure() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

/// Failure of a bring-up group, naming the first step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitFailure {
    pub group: &'static str,
    pub step: &'static str,
    pub error: Error,
    /// Number of failed steps in the group
    pub failures: usize,
}

impl fmt::Display for InitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} failed: {} ({} failed step(s))",
            self.group, self.step, self.error, self.failures
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InitFailure {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{}/{} failed: {} ({} failed)",
            self.group,
            self.step,
            self.error,
            self.failures
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DriverError;

    #[test]
    fn test_report_keeps_order_and_first_failure() {
        let mut report: InitReport<4> = InitReport::new("radio");
        assert!(report.record("init", Ok(())).is_ok());
        let _ = report.record("tx_power", Err::<(), _>(Error::Driver(DriverError::InvalidParam)));
        let _ = report.record("interval", Err::<(), _>(Error::Driver(DriverError::Busy)));

        assert!(!report.is_ok());
        assert_eq!(report.steps().len(), 3);
        let failure = report.finish().unwrap_err();
        assert_eq!(failure.step, "tx_power");
        assert_eq!(failure.group, "radio");
        assert_eq!(failure.error, Error::Driver(DriverError::InvalidParam));
        assert_eq!(failure.failures, 2);
    }

    #[test]
    fn test_empty_report_is_ok() {
        let report: InitReport = InitReport::new("empty");
        assert!(report.is_ok());
        assert!(report.finish().is_ok());
    }
}
