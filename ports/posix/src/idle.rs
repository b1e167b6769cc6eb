//! Condition-variable stand-in for `WFI`

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use beacon_sched::Idle;

/// Longest sleep without an interrupt, so shutdown requests are noticed
const MAX_SLEEP: Duration = Duration::from_millis(100);

/// Interrupt line shared by the simulated interrupt sources
#[derive(Default)]
pub struct Wakeup {
    pending: Mutex<bool>,
    signal: Condvar,
}

impl Wakeup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the interrupt; call after enqueueing
    pub fn notify(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        *pending = true;
        self.signal.notify_all();
    }

    /// Sleep until notified, `has_work` holds or `timeout` elapses
    pub fn wait(&self, has_work: &dyn Fn() -> bool, timeout: Duration) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if !*pending && !has_work() {
            pending = match self.signal.wait_timeout_while(pending, timeout, |p| !*p) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        *pending = false;
    }
}

/// [`Idle`] that blocks the main thread on a [`Wakeup`]
pub struct CondvarIdle {
    wakeup: Arc<Wakeup>,
    low_power: bool,
}

impl CondvarIdle {
    pub fn new(wakeup: Arc<Wakeup>) -> Self {
        Self {
            wakeup,
            low_power: false,
        }
    }
}

impl Idle for CondvarIdle {
    fn wait_for_interrupt(&mut self, has_work: &dyn Fn() -> bool) {
        if self.low_power {
            self.wakeup.wait(has_work, MAX_SLEEP);
        } else if !has_work() {
            std::thread::yield_now();
        }
    }

    fn low_power_enable(&mut self, enable: bool) {
        self.low_power = enable;
    }
}
