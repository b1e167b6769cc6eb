#![no_std]
#![forbid(unsafe_code)]

//! # Beacon Scheduler
//!
//! Single-threaded cooperative executor. Interrupts enqueue events; the main
//! loop alternates between [`Scheduler::execute`], which runs every pending
//! event to completion, and [`Scheduler::wait`], the only point where the
//! processor is suspended.

use beacon_core::{TASK_DATA_MAX_SIZE, TASK_QUEUE_MAX_LENGTH};
use beacon_queue::EventQueue;

pub mod idle;
pub mod timer;

pub use idle::*;
pub use timer::*;

/// Scheduling counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Calls to `execute`
    pub passes: u32,
    /// Events run across all passes
    pub executed: u32,
    /// Calls to `wait`
    pub waits: u32,
}

/// Main-loop driver over an event queue
pub struct Scheduler<
    'q,
    C,
    I: Idle,
    const Q: usize = { TASK_QUEUE_MAX_LENGTH },
    const N: usize = { TASK_DATA_MAX_SIZE },
> {
    queue: &'q EventQueue<C, Q, N>,
    idle: I,
    stats: SchedulerStats,
}

impl<'q, C, I: Idle, const Q: usize, const N: usize> Scheduler<'q, C, I, Q, N> {
    /// Create a scheduler draining `queue` and sleeping through `idle`
    pub fn new(queue: &'q EventQueue<C, Q, N>, idle: I) -> Self {
        Self {
            queue,
            idle,
            stats: SchedulerStats::default(),
        }
    }

    /// Queue this scheduler drains
    pub fn queue(&self) -> &'q EventQueue<C, Q, N> {
        self.queue
    }

    /// Low-power wait primitive
    pub fn idle_mut(&mut self) -> &mut I {
        &mut self.idle
    }

    /// Run all pending events, including those enqueued while running
    pub fn execute(&mut self, ctx: &mut C) -> usize {
        let executed = self.queue.execute_pending(ctx);
        self.stats.passes = self.stats.passes.wrapping_add(1);
        self.stats.executed = self.stats.executed.wrapping_add(executed as u32);
        if executed > 0 {
            log::trace!("executed {} event(s)", executed);
        }
        executed
    }

    /// Suspend until the next interrupt
    ///
    /// Returns at once when an event is already pending, so anything enqueued
    /// before the call is seen by the next `execute`.
    pub fn wait(&mut self) {
        let queue = self.queue;
        self.stats.waits = self.stats.waits.wrapping_add(1);
        self.idle.wait_for_interrupt(&|| !queue.is_empty());
    }

    /// Drain, then sleep, forever
    pub fn run(&mut self, ctx: &mut C) -> ! {
        loop {
            self.execute(ctx);
            self.wait();
        }
    }

    /// Scheduling counters
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}
