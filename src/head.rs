//! The head of the logical stream: the one-slot peek cache and the consumer
//! turn that guards waiting on the buffer.
//!
//! Only the consumer holding the turn may pull from the buffer. The slot lock
//! itself is only ever held briefly, so clearing the cache never waits behind
//! a consumer that is blocked on the buffer.

use crate::deadline::Deadline;

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct Slot<E> {
    cached: Option<E>,
    busy: bool,
}

pub(crate) struct Head<E> {
    slot: Mutex<Slot<E>>,
    idle: Condvar,
}

/// Result of trying to obtain the next event through the head.
pub(crate) enum Claim<'a, E> {
    /// The cache answered without touching the buffer.
    Ready(E),
    /// Nothing cached; the caller now owns the turn and may wait on the buffer.
    Turn(Turn<'a, E>),
    /// Another consumer kept the turn past the deadline.
    Expired,
}

impl<E> Head<E> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                cached: None,
                busy: false,
            }),
            idle: Condvar::new(),
        }
    }

    // The slot is consistent after every statement, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, Slot<E>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for the turn to be free, then either answers from the cache via
    /// `extract` or hands the turn to the caller.
    pub(crate) fn claim<F>(&self, deadline: &Deadline, extract: F) -> Claim<'_, E>
    where
        F: FnOnce(&mut Option<E>) -> Option<E>,
    {
        let mut slot = self.lock();
        while slot.busy {
            slot = match deadline.remaining() {
                None => self.idle.wait(slot).unwrap_or_else(PoisonError::into_inner),
                Some(left) if left.is_zero() => return Claim::Expired,
                Some(left) => match self.idle.wait_timeout(slot, left) {
                    Ok((slot, _)) => slot,
                    Err(poisoned) => poisoned.into_inner().0,
                },
            };
        }

        if let Some(event) = extract(&mut slot.cached) {
            return Claim::Ready(event);
        }
        slot.busy = true;
        Claim::Turn(Turn { head: self })
    }

    /// Clears the cache without waiting for the turn.
    pub(crate) fn take(&self) -> Option<E> {
        self.lock().cached.take()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().cached.is_none()
    }
}

/// Exclusive right to wait on the buffer. Released on drop.
pub(crate) struct Turn<'a, E> {
    head: &'a Head<E>,
}

impl<E> Turn<'_, E> {
    /// Stores a freshly pulled event as the new head and releases the turn.
    pub(crate) fn cache(self, event: E) {
        self.head.lock().cached = Some(event);
    }
}

impl<E> Drop for Turn<'_, E> {
    fn drop(&mut self) {
        self.head.lock().busy = false;
        self.head.idle.notify_all();
    }
}
