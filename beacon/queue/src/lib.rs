#![no_std]
#![forbid(unsafe_code)]

//! # Beacon Event Queue
//!
//! Fixed-capacity FIFO of deferred work. Interrupt handlers copy what they
//! decoded from the hardware into an [`Event`] and enqueue it; the main loop
//! drains the queue and runs each handler in normal context, one at a time.
//!
//! Storage is reserved up front: `Q` slots of `N` payload bytes each.

pub mod event;
pub mod queue;

pub use event::*;
pub use queue::*;

pub use beacon_core::{Error, Result};
