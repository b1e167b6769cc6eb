//! Low-power wait primitive

/// Processor suspension used by the main loop
pub trait Idle {
    /// Sleep until an interrupt fires
    ///
    /// Must not sleep when `has_work` reports pending events; the check and
    /// the sleep have to be atomic with respect to interrupts.
    fn wait_for_interrupt(&mut self, has_work: &dyn Fn() -> bool);

    /// Allow or forbid entering low-power mode while waiting
    fn low_power_enable(&mut self, _enable: bool) {}
}

/// Idle that never sleeps; the main loop degrades to polling
#[derive(Debug, Default, Clone, Copy)]
pub struct BusyIdle;

impl Idle for BusyIdle {
    fn wait_for_interrupt(&mut self, _has_work: &dyn Fn() -> bool) {
        core::hint::spin_loop();
    }
}

/// Cortex-M idle based on `WFI`
///
/// Interrupts are masked while the queue is checked; a pending interrupt
/// still wakes `WFI`, and its handler runs as soon as the mask is lifted.
#[cfg(target_arch = "arm")]
#[derive(Debug, Default)]
pub struct WfiIdle {
    low_power: bool,
}

#[cfg(target_arch = "arm")]
impl WfiIdle {
    pub const fn new() -> Self {
        Self { low_power: false }
    }
}

#[cfg(target_arch = "arm")]
impl Idle for WfiIdle {
    fn wait_for_interrupt(&mut self, has_work: &dyn Fn() -> bool) {
        if !self.low_power {
            return;
        }
        cortex_m::interrupt::free(|_| {
            if !has_work() {
                cortex_m::asm::wfi();
            }
        });
    }

    fn low_power_enable(&mut self, enable: bool) {
        self.low_power = enable;
    }
}
