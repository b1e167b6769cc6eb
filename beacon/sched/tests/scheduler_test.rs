use std::cell::Cell;

use beacon_queue::{Enqueue, EventQueue};
use beacon_sched::{BusyIdle, Idle, Scheduler};

#[derive(Default)]
struct Counter {
    runs: u32,
}

fn bump(ctx: &mut Counter, _sink: &dyn Enqueue<Counter>, _payload: &[u8]) {
    ctx.runs += 1;
}

/// Records whether a sleep would have happened
#[derive(Default)]
struct RecordingIdle {
    slept: Cell<u32>,
    skipped: Cell<u32>,
}

impl Idle for &RecordingIdle {
    fn wait_for_interrupt(&mut self, has_work: &dyn Fn() -> bool) {
        if has_work() {
            self.skipped.set(self.skipped.get() + 1);
        } else {
            self.slept.set(self.slept.get() + 1);
        }
    }
}

#[test]
fn test_execute_drains_queue() {
    let queue: EventQueue<Counter, 8, 4> = EventQueue::new();
    let mut scheduler = Scheduler::new(&queue, BusyIdle);
    let mut ctx = Counter::default();

    queue.enqueue(bump, &[]).unwrap();
    queue.enqueue(bump, &[]).unwrap();

    assert_eq!(scheduler.execute(&mut ctx), 2);
    assert_eq!(ctx.runs, 2);
    assert!(queue.is_empty());

    // Nothing pending: a pass is a no-op
    assert_eq!(scheduler.execute(&mut ctx), 0);

    let stats = scheduler.stats();
    assert_eq!(stats.passes, 2);
    assert_eq!(stats.executed, 2);
}

#[test]
fn test_wait_does_not_sleep_with_pending_work() {
    let queue: EventQueue<Counter, 8, 4> = EventQueue::new();
    let idle = RecordingIdle::default();
    let mut scheduler = Scheduler::new(&queue, &idle);
    let mut ctx = Counter::default();

    // Event raised after the last execute but before wait
    queue.enqueue(bump, &[]).unwrap();
    scheduler.wait();
    assert_eq!(idle.skipped.get(), 1);
    assert_eq!(idle.slept.get(), 0);

    assert_eq!(scheduler.execute(&mut ctx), 1);
    scheduler.wait();
    assert_eq!(idle.slept.get(), 1);
    assert_eq!(scheduler.stats().waits, 2);
}
