//! Software timers driven by a monotonic millisecond clock
//!
//! Timers never run work in interrupt context: an expired timer enqueues its
//! handler, which then runs from the main loop like any other event.

use core::cell::RefCell;
use critical_section::Mutex;
use heapless::Vec;

use beacon_core::{DriverError, Error, Result, Timestamp, TimerMode, TIMER_MAX_INSTANCES};
use beacon_queue::{Enqueue, Handler};

/// Handle returned by [`TimerWheel::create`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u8);

impl TimerId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "TimerId({})", self.0);
    }
}

struct TimerSlot<C> {
    handler: Handler<C>,
    mode: TimerMode,
    interval_ms: u32,
    deadline: Timestamp,
    armed: bool,
}

/// Fixed pool of one-shot and periodic timers
pub struct TimerWheel<C, const T: usize = { TIMER_MAX_INSTANCES }> {
    slots: Mutex<RefCell<Vec<TimerSlot<C>, T>>>,
}

impl<C, const T: usize> TimerWheel<C, T> {
    const IDS_FIT: () = assert!(T <= u8::MAX as usize + 1, "timer ids are 8 bits wide");

    pub const fn new() -> Self {
        let () = Self::IDS_FIT;
        Self {
            slots: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Allocate a timer; it stays stopped until [`start`](Self::start)
    pub fn create(&self, handler: Handler<C>, mode: TimerMode) -> Result<TimerId> {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let id = TimerId(slots.len() as u8);
            slots
                .push(TimerSlot {
                    handler,
                    mode,
                    interval_ms: 0,
                    deadline: Timestamp::ZERO,
                    armed: false,
                })
                .map_err(|_| Error::NoMemory)?;
            Ok(id)
        })
    }

    /// Arm `id` to expire `interval_ms` after `now`
    ///
    /// Restarting a running timer moves its deadline.
    pub fn start(&self, id: TimerId, interval_ms: u32, now: Timestamp) -> Result<()> {
        if interval_ms == 0 {
            return Err(Error::Driver(DriverError::InvalidParam));
        }
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let slot = slots.get_mut(id.index()).ok_or(Error::NotFound)?;
            slot.interval_ms = interval_ms;
            slot.deadline = now.add_millis(interval_ms);
            slot.armed = true;
            Ok(())
        })
    }

    /// Disarm `id`; stopping a stopped timer is not an error
    pub fn stop(&self, id: TimerId) -> Result<()> {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let slot = slots.get_mut(id.index()).ok_or(Error::NotFound)?;
            slot.armed = false;
            Ok(())
        })
    }

    pub fn is_running(&self, id: TimerId) -> bool {
        critical_section::with(|cs| {
            self.slots
                .borrow_ref(cs)
                .get(id.index())
                .map_or(false, |slot| slot.armed)
        })
    }

    /// Earliest deadline among armed timers, for programming a wake-up
    pub fn next_deadline(&self, now: Timestamp) -> Option<Timestamp> {
        critical_section::with(|cs| {
            self.slots
                .borrow_ref(cs)
                .iter()
                .filter(|slot| slot.armed)
                .map(|slot| slot.deadline)
                .min_by_key(|deadline| {
                    if now.has_reached(*deadline) {
                        0
                    } else {
                        deadline.elapsed_since(now)
                    }
                })
        })
    }

    /// Enqueue the handler of every timer that expired at `now`
    ///
    /// Periodic timers re-arm from their previous deadline so the period does
    /// not drift; a timer that missed several periods fires once. Returns the
    /// number of handlers enqueued.
    pub fn tick(&self, now: Timestamp, sink: &dyn Enqueue<C>) -> usize {
        let expired: Vec<Handler<C>, T> = critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let mut expired = Vec::new();
            for slot in slots.iter_mut().filter(|slot| slot.armed) {
                if !now.has_reached(slot.deadline) {
                    continue;
                }
                match slot.mode {
                    TimerMode::OneShot => slot.armed = false,
                    TimerMode::Periodic => {
                        let periods = now.elapsed_since(slot.deadline) / slot.interval_ms + 1;
                        slot.deadline = slot
                            .deadline
                            .add_millis(periods.wrapping_mul(slot.interval_ms));
                    }
                }
                // Capacity equals the slot count
                let _ = expired.push(slot.handler);
            }
            expired
        });

        let mut fired = 0;
        for handler in expired {
            match sink.enqueue(handler, &[]) {
                Ok(()) => fired += 1,
                Err(err) => log::error!("timer expiry lost: {}", err),
            }
        }
        fired
    }
}

impl<C, const T: usize> Default for TimerWheel<C, T> {
    fn default() -> Self {
        Self::new()
    }
}
