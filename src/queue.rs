//! Bounded event queue with a one-slot peek cache.
//!
//! Producers hand events to consumers through a bounded crossbeam channel.
//! The queue owns the only long-lived sender; closing drops it together with
//! a shutdown signal, so blocked producers fail fast and consumers see the
//! channel disconnect once the buffer is drained.

use crate::{
    Producer, Received, Receiver,
    deadline::Deadline,
    error::{Error, Result},
    head::{Claim, Head},
};

use crossbeam_channel::{RecvTimeoutError, Sender, TrySendError, bounded, select};
use log::{debug, trace};
use std::{
    fmt,
    sync::{
        PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// Buffer capacity used by [`EventQueue::new`].
pub const DEFAULT_CAPACITY: usize = 10;

struct Inlet<E> {
    events: Sender<E>,
    // Never sent on; dropping it wakes every producer waiting in `publish`.
    _shutdown: Sender<()>,
}

/// A bounded FIFO of events shared by producers and consumers.
///
/// Share it between threads behind an [`Arc`](std::sync::Arc). All
/// operations take `&self`.
///
/// The queue keeps one logical stream: an event cached by [`peek`] stays the
/// head of the stream until it is consumed by [`read_peek`] or [`read`].
///
/// [`peek`]: EventQueue::peek
/// [`read_peek`]: EventQueue::read_peek
/// [`read`]: EventQueue::read
pub struct EventQueue<E> {
    closed: AtomicBool,
    inlet: RwLock<Option<Inlet<E>>>,
    events: crossbeam_channel::Receiver<E>,
    shutdown: crossbeam_channel::Receiver<()>,
    head: Head<E>,
    capacity: usize,
}

impl<E> EventQueue<E> {
    /// Creates an open, empty queue holding up to [`DEFAULT_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an open, empty queue holding up to `capacity` events.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (events_tx, events) = bounded(capacity);
        let (shutdown_tx, shutdown) = bounded(0);
        debug!("event queue created with capacity {capacity}");

        Self {
            closed: AtomicBool::new(false),
            inlet: RwLock::new(Some(Inlet {
                events: events_tx,
                _shutdown: shutdown_tx,
            })),
            events,
            shutdown,
            head: Head::new(),
            capacity,
        }
    }

    /// Appends an event, waiting while the buffer is full.
    ///
    /// `timeout` bounds the whole call: the deadline is fixed on entry. An
    /// event is appended immediately whenever there is room, without waiting.
    ///
    /// # Errors
    ///
    /// [`Error::WriteTimeout`] if the buffer stayed full until the deadline,
    /// [`Error::QueueClosed`] if the queue is closed, including while this
    /// call is waiting.
    pub fn publish(&self, event: E, timeout: Duration) -> Result<()> {
        let deadline = Deadline::after(timeout);
        let Some(events) = self.sender() else {
            return Err(Error::QueueClosed);
        };

        let event = match events.try_send(event) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(event)) => event,
            Err(TrySendError::Disconnected(_)) => return Err(Error::QueueClosed),
        };

        select! {
            send(events, event) -> sent => sent.map_err(|_| Error::QueueClosed),
            recv(self.shutdown) -> _ => Err(Error::QueueClosed),
            recv(deadline.timer()) -> _ => {
                trace!("publish timed out after {timeout:?} with {} events buffered", self.len());
                Err(Error::WriteTimeout)
            }
        }
    }

    /// Closes the queue for writing.
    ///
    /// Only the first call has an effect. Buffered events remain readable;
    /// once they are drained, every [`read`](EventQueue::read) and
    /// [`peek`](EventQueue::peek) returns [`Received::EndOfStream`].
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let inlet = self
            .inlet
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(inlet);
        debug!("event queue closed with {} events left to drain", self.len());
    }

    /// Clears and returns the cached peek, if any.
    ///
    /// Never touches the buffer and never waits for another consumer.
    pub fn read_peek(&self) -> Option<E> {
        self.head.take()
    }

    /// Removes and returns the next event, waiting up to `timeout`.
    ///
    /// An event cached by [`peek`](EventQueue::peek) is the head of the
    /// stream and is returned before anything still buffered.
    ///
    /// # Errors
    ///
    /// [`Error::ReadTimeout`] if neither an event nor end-of-stream arrived in
    /// time.
    pub fn read(&self, timeout: Duration) -> Result<Received<E>> {
        let deadline = Deadline::after(timeout);
        match self.head.claim(&deadline, Option::take) {
            Claim::Ready(event) => Ok(Received::Event(event)),
            Claim::Expired => Err(Error::ReadTimeout),
            Claim::Turn(_turn) => self.pull(&deadline),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered events, not counting a cached peek.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing is buffered and nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.head.is_empty()
    }

    fn sender(&self) -> Option<Sender<E>> {
        self.inlet
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|inlet| inlet.events.clone())
    }

    // Callers must hold the consumer turn.
    fn pull(&self, deadline: &Deadline) -> Result<Received<E>> {
        let received = match deadline.instant() {
            Some(when) => self.events.recv_deadline(when),
            None => self.events.recv().map_err(RecvTimeoutError::from),
        };

        match received {
            Ok(event) => Ok(Received::Event(event)),
            Err(RecvTimeoutError::Disconnected) => {
                trace!("event queue drained, delivering end of stream");
                Ok(Received::EndOfStream)
            }
            Err(RecvTimeoutError::Timeout) => {
                trace!("read timed out");
                Err(Error::ReadTimeout)
            }
        }
    }
}

impl<E: Clone> EventQueue<E> {
    /// Returns the next event without consuming it, waiting up to `timeout`.
    ///
    /// The first successful peek caches the event; further peeks return a
    /// clone of the same event without waiting until it is consumed by
    /// [`read_peek`](EventQueue::read_peek) or [`read`](EventQueue::read).
    /// End-of-stream is never cached.
    ///
    /// # Errors
    ///
    /// [`Error::ReadTimeout`] if neither an event nor end-of-stream arrived in
    /// time.
    pub fn peek(&self, timeout: Duration) -> Result<Received<E>> {
        let deadline = Deadline::after(timeout);
        let turn = match self.head.claim(&deadline, |cached| cached.clone()) {
            Claim::Ready(event) => return Ok(Received::Event(event)),
            Claim::Expired => return Err(Error::ReadTimeout),
            Claim::Turn(turn) => turn,
        };

        match self.pull(&deadline)? {
            Received::Event(event) => {
                turn.cache(event.clone());
                Ok(Received::Event(event))
            }
            Received::EndOfStream => Ok(Received::EndOfStream),
        }
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("peeked", &!self.head.is_empty())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<E> Producer for EventQueue<E> {
    type Event = E;

    fn publish(&self, event: E, timeout: Duration) -> Result<()> {
        EventQueue::publish(self, event, timeout)
    }
}

impl<E> Receiver for EventQueue<E> {
    type Event = E;

    fn recv(&self, timeout: Duration) -> Result<Received<E>> {
        self.read(timeout)
    }
}
