//! Absolute deadlines shared by every wait inside a single call.

use crossbeam_channel::{Receiver, at, never};
use std::time::{Duration, Instant};

/// A point in time fixed when an operation starts.
///
/// A timeout too large to represent as an [`Instant`] means "wait forever".
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    pub(crate) fn after(timeout: Duration) -> Self {
        Self(Instant::now().checked_add(timeout))
    }

    pub(crate) fn instant(&self) -> Option<Instant> {
        self.0
    }

    /// Time left before the deadline, `None` when unbounded.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.0
            .map(|when| when.saturating_duration_since(Instant::now()))
    }

    /// A channel that becomes ready when the deadline passes.
    pub(crate) fn timer(&self) -> Receiver<Instant> {
        match self.0 {
            Some(when) => at(when),
            None => never(),
        }
    }
}
