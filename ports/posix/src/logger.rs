//! Host log sink
//!
//! `log` records from the firmware crates are bridged into a `tracing`
//! fmt subscriber writing to stdout.

use log::LevelFilter;
use tracing_log::AsTrace;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Install the fmt subscriber and the `log` bridge as the global sink
pub fn init(level: LevelFilter) -> Result<(), TryInitError> {
    tracing_subscriber::fmt()
        .with_max_level(level.as_trace())
        .with_target(true)
        .finish()
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installs_once() {
        assert!(init(LevelFilter::Debug).is_ok());
        log::debug!(target: "beacon_tasks::advertisement", "relay in flight");
        assert!(init(LevelFilter::Info).is_err());
    }
}
