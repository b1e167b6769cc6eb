//! Host port of the relay beacon
//!
//! Runs the unmodified firmware core on Linux/Unix. Peripheral drivers are
//! simulated, threads stand in for interrupt sources and a condition
//! variable replaces `WFI`.

pub mod board;
pub mod idle;
pub mod logger;
pub mod runtime;
pub mod sim;

pub use board::{SimBoard, SimOptions};
pub use idle::{CondvarIdle, Wakeup};
pub use runtime::{is_running, start, stop};

/// Application context type on the host
pub type App = beacon_app::Beacon<SimBoard, 2>;
