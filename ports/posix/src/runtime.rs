//! Run flag shared by the main loop and the interrupt threads

use std::sync::atomic::{AtomicBool, Ordering};

static RUNNING: AtomicBool = AtomicBool::new(false);

/// Mark the firmware as running
pub fn start() {
    RUNNING.store(true, Ordering::SeqCst);
}

/// Ask the main loop and every simulated interrupt source to finish
pub fn stop() {
    RUNNING.store(false, Ordering::SeqCst);
}

pub fn is_running() -> bool {
    RUNNING.load(Ordering::Relaxed)
}
