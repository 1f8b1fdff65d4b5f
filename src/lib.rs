//! A bounded, thread-safe event queue for producer/consumer hand-off.
//!
//! [`EventQueue`] moves opaque events from any number of producers to any
//! number of consumers through a fixed-capacity FIFO buffer. Consumers may
//! peek at the next event without consuming it, and closing the queue lets
//! consumers drain what is left before they observe
//! [`Received::EndOfStream`].

pub mod consumer;
pub mod error;
pub mod logic;
pub mod queue;

mod deadline;
mod head;

pub use error::{Error, Result};
pub use logic::Logic;
pub use queue::{DEFAULT_CAPACITY, EventQueue};

use std::time::Duration;

/// Outcome of a successful receive.
///
/// End-of-stream is a variant of its own rather than an empty event, so
/// every value a producer publishes is delivered as [`Received::Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received<E> {
    /// The next event of the stream.
    Event(E),
    /// The source was closed and fully drained. No further events will arrive.
    EndOfStream,
}

impl<E> Received<E> {
    /// Returns the event, or `None` at end of stream.
    pub fn into_event(self) -> Option<E> {
        match self {
            Received::Event(event) => Some(event),
            Received::EndOfStream => None,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Received::EndOfStream)
    }
}

/// The consuming half of an event transport.
///
/// This trait abstracts over sources of events so the same consumer loop can
/// be driven from different transports, providing a unified interface for
/// blocking receives with a timeout.
pub trait Receiver {
    type Event;

    /// Receives the next event, blocking until data is available, the source
    /// reports end-of-stream, or the timeout expires.
    ///
    /// A timeout is reported as [`Error::ReadTimeout`] and is recoverable:
    /// the caller may simply call `recv` again.
    fn recv(&self, timeout: Duration) -> Result<Received<Self::Event>>;
}

/// The publishing half of an event transport.
pub trait Producer {
    type Event;

    /// Publishes an event, blocking while the transport has no room for it.
    ///
    /// The timeout bounds the whole call. Fails with [`Error::WriteTimeout`]
    /// when no room appeared in time and with [`Error::QueueClosed`] once the
    /// transport stopped accepting events.
    fn publish(&self, event: Self::Event, timeout: Duration) -> Result<()>;
}
