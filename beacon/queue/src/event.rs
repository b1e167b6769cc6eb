//! Deferred unit of work

use core::fmt;
use heapless::Vec;

use crate::{Error, Result};

/// Work function run by the main loop
///
/// Receives the application context, the queue (so it can defer follow-up
/// work) and the payload copied in at enqueue time.
pub type Handler<C> = fn(&mut C, &dyn Enqueue<C>, &[u8]);

/// Producer side of an event queue
pub trait Enqueue<C> {
    /// Copy `payload` into a free slot together with `handler`
    ///
    /// Never blocks. Fails with [`Error::DataSize`] when the payload does not
    /// fit a slot and [`Error::QueueFull`] when no slot is free; in both cases
    /// the queue is left untouched.
    fn enqueue(&self, handler: Handler<C>, payload: &[u8]) -> Result<()>;
}

/// Handler plus a by-value copy of its payload
pub struct Event<C, const N: usize> {
    handler: Handler<C>,
    payload: Vec<u8, N>,
}

impl<C, const N: usize> Event<C, N> {
    /// Create an event, rejecting payloads longer than a slot
    pub fn new(handler: Handler<C>, payload: &[u8]) -> Result<Self> {
        let payload = Vec::from_slice(payload).map_err(|_| Error::DataSize)?;
        Ok(Self { handler, payload })
    }

    /// Handler the event will run
    pub fn handler(&self) -> Handler<C> {
        self.handler
    }

    /// Copied payload
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Run the handler, consuming the event
    pub fn run(self, ctx: &mut C, sink: &dyn Enqueue<C>) {
        (self.handler)(ctx, sink, &self.payload);
    }
}

impl<C, const N: usize> fmt::Debug for Event<C, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("handler", &(self.handler as usize as *const ()))
            .field("payload", &self.payload.as_slice())
            .finish()
    }
}
