//! Interrupt-safe event queue

use core::cell::RefCell;
use critical_section::Mutex;
use heapless::Deque;

use beacon_core::{TASK_DATA_MAX_SIZE, TASK_QUEUE_MAX_LENGTH};

use crate::{Enqueue, Error, Event, Handler, Result};

/// Queue usage counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Number of slots
    pub capacity: usize,
    /// Events currently pending
    pub pending: usize,
    /// Largest number of pending events ever observed
    pub high_water: usize,
    /// Events dropped because the queue was full
    pub dropped: usize,
}

impl QueueStats {
    const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pending: 0,
            high_water: 0,
            dropped: 0,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for QueueStats {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "QueueStats{{ capacity: {}, pending: {}, high_water: {}, dropped: {} }}",
            self.capacity,
            self.pending,
            self.high_water,
            self.dropped
        );
    }
}

struct Slots<C, const Q: usize, const N: usize> {
    events: Deque<Event<C, N>, Q>,
    stats: QueueStats,
}

/// Bounded FIFO of pending events
///
/// Producers may run in interrupt context; each access holds a critical
/// section only for a constant-time push or pop. Exactly one consumer, the
/// main loop, drains the queue.
pub struct EventQueue<C, const Q: usize = { TASK_QUEUE_MAX_LENGTH }, const N: usize = { TASK_DATA_MAX_SIZE }> {
    slots: Mutex<RefCell<Slots<C, Q, N>>>,
}

impl<C, const Q: usize, const N: usize> EventQueue<C, Q, N> {
    /// Create an empty queue; usable in a `static`
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Slots {
                events: Deque::new(),
                stats: QueueStats::new(Q),
            })),
        }
    }

    /// Remove the oldest pending event
    ///
    /// Main-loop context only.
    pub fn drain_one(&self) -> Option<Event<C, N>> {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let event = slots.events.pop_front();
            slots.stats.pending = slots.events.len();
            event
        })
    }

    /// Run pending events in FIFO order until the queue is empty
    ///
    /// Events enqueued by a handler, or by an interrupt while a handler runs,
    /// are executed in the same pass. Returns the number of events run.
    pub fn execute_pending(&self, ctx: &mut C) -> usize {
        let mut executed = 0;
        while let Some(event) = self.drain_one() {
            event.run(ctx, self);
            executed += 1;
        }
        executed
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.slots.borrow_ref(cs).events.is_empty())
    }

    /// Get the number of pending events
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.slots.borrow_ref(cs).events.len())
    }

    /// Get the maximum capacity of the queue
    pub const fn capacity(&self) -> usize {
        Q
    }

    /// Bytes reserved per slot
    pub const fn slot_size(&self) -> usize {
        N
    }

    /// Snapshot of the usage counters
    pub fn stats(&self) -> QueueStats {
        critical_section::with(|cs| self.slots.borrow_ref(cs).stats)
    }

    /// Discard every pending event; only used when restarting
    pub fn clear(&self) {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            slots.events.clear();
            slots.stats.pending = 0;
        });
    }
}

impl<C, const Q: usize, const N: usize> Enqueue<C> for EventQueue<C, Q, N> {
    fn enqueue(&self, handler: Handler<C>, payload: &[u8]) -> Result<()> {
        let event = Event::new(handler, payload)?;
        let result = critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            match slots.events.push_back(event) {
                Ok(()) => {
                    let pending = slots.events.len();
                    slots.stats.pending = pending;
                    if pending > slots.stats.high_water {
                        slots.stats.high_water = pending;
                    }
                    Ok(())
                }
                Err(_) => {
                    slots.stats.dropped += 1;
                    Err(Error::QueueFull)
                }
            }
        });
        if result.is_err() {
            log::warn!("event queue full, event dropped");
        }
        result
    }
}

impl<C, const Q: usize, const N: usize> Default for EventQueue<C, Q, N> {
    fn default() -> Self {
        Self::new()
    }
}
