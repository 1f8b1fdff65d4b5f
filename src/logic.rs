/// Event-handling logic driven by a consumer loop.
///
/// This trait separates what a consumer does with each event from how the
/// events are received, allowing the same logic to run against any
/// [`Receiver`](crate::Receiver).
pub trait Logic<E> {
    /// Handles a single event.
    ///
    /// Returns `true` to continue processing, or `false` to stop.
    fn step(&mut self, event: E) -> bool;

    /// Called when a receive timed out without an event.
    ///
    /// Implementations can use this to do housekeeping or to give up on a
    /// quiet source. Returns `true` to keep waiting, or `false` to stop.
    fn idle(&mut self) -> bool {
        true
    }
}
