//! Object-safe stream interface.
//!
//! Code that receives values of unknown shape (host properties, configuration
//! output) checks for a stream by looking for this capability rather than by
//! matching a concrete type.

use super::stream::{ListenerId, Stream};

/// Operations any stream-like value offers.
pub trait StreamCapability<T> {
    /// Current value, if any.
    fn current(&self) -> Option<T>;

    /// Whether a value has been received.
    fn has_value(&self) -> bool;

    /// Remove a listener.
    fn unsubscribe(&self, id: ListenerId) -> bool;

    /// Derive a stream through `f`.
    fn derive(&self, f: Box<dyn Fn(&T) -> T>) -> Stream<T>;

    /// End the stream and everything derived from it.
    fn end(&self);

    /// Whether the stream has ended.
    fn is_ended(&self) -> bool;
}

impl<T: Clone + 'static> StreamCapability<T> for Stream<T> {
    fn current(&self) -> Option<T> {
        Stream::current(self)
    }

    fn has_value(&self) -> bool {
        Stream::has_value(self)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        Stream::unsubscribe(self, id)
    }

    fn derive(&self, f: Box<dyn Fn(&T) -> T>) -> Stream<T> {
        self.map(f)
    }

    fn end(&self) {
        Stream::end(self)
    }

    fn is_ended(&self) -> bool {
        Stream::is_ended(self)
    }
}
