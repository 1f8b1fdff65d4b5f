use crate::{Error, Logic, Received, Receiver, Result};

use log::{debug, info};
use std::time::Duration;

/// Why a consumer loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The logic asked to stop, from [`Logic::step`] or [`Logic::idle`].
    Stopped,
    /// The receiver was closed and drained.
    EndOfStream,
}

/// Runs the consumer loop, reading events from the given receiver.
///
/// Repeatedly calls [`recv`] with `interval` as the timeout, passing each
/// event to [`step`]. A timeout calls [`idle`] instead.
///
/// The loop continues until the logic returns `false` or the receiver
/// reports end-of-stream. Errors other than [`Error::ReadTimeout`] are
/// returned to the caller.
///
/// [`recv`]: Receiver::recv
/// [`step`]: Logic::step
/// [`idle`]: Logic::idle
pub fn run<R, L>(receiver: &R, logic: &mut L, interval: Duration) -> Result<Outcome>
where
    R: Receiver,
    L: Logic<R::Event>,
{
    loop {
        match receiver.recv(interval) {
            Ok(Received::Event(event)) => {
                if !logic.step(event) {
                    debug!("consumer stopped by logic");
                    return Ok(Outcome::Stopped);
                }
            }
            Ok(Received::EndOfStream) => {
                info!("consumer reached end of stream");
                return Ok(Outcome::EndOfStream);
            }
            Err(Error::ReadTimeout) => {
                if !logic.idle() {
                    debug!("consumer stopped while idle");
                    return Ok(Outcome::Stopped);
                }
            }
            Err(err) => return Err(err),
        }
    }
}
