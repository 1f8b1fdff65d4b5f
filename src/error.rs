//! Error types for evqueue

/// Errors returned by queue operations.
///
/// End-of-stream is not an error; it is reported as
/// [`Received::EndOfStream`](crate::Received::EndOfStream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The buffer stayed full until the publish deadline passed.
    #[error("event queue write timeout")]
    WriteTimeout,

    /// No event and no end-of-stream arrived before the read deadline.
    #[error("event queue read timeout")]
    ReadTimeout,

    /// The queue was closed before the event could be appended.
    #[error("event queue is closed")]
    QueueClosed,
}

impl Error {
    /// Returns `true` for the recoverable deadline errors.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::WriteTimeout | Error::ReadTimeout)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
