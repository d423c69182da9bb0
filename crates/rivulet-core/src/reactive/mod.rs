//! # Push Streams
//!
//! `Stream<T>` is a mutable container of an optional current value. Values are
//! pushed in and propagate synchronously to every derived stream and listener
//! before `push` returns.
//!
//! ## Contract
//!
//! 1. **Replay on subscribe**: `subscribe` invokes the listener with the
//!    current value (if any) before returning, then with every later value.
//! 2. **Eager derivation**: a derived stream computes from the current upstream
//!    state when it is created.
//! 3. **Glitch-free waves**: one push is one wave. Derived streams are
//!    re-evaluated in rank order, each at most once per wave, so a stream that
//!    depends on two branches of a diamond never observes a half-updated pair.
//! 4. **Nested pushes are queued**: a push made by a listener while a wave is
//!    running starts its own wave after the current one, still before the
//!    outermost `push` returns.
//! 5. **End propagates downstream**: ending a stream ends every stream derived
//!    from it (`merge` ends once all its inputs have ended). Ending is
//!    idempotent and releases listeners and dependents.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rivulet_core::Stream;
//!
//! let clicks = Stream::new();
//! let total = clicks.scan(0, |acc, n: &i32| acc + n);
//!
//! clicks.push(2);
//! clicks.push(3);
//! assert_eq!(total.current(), Some(5));
//!
//! clicks.end();
//! assert!(total.is_ended());
//! ```

mod capability;
mod combinators;
mod graph;
mod propagation;
mod stream;

pub use capability::StreamCapability;
pub use stream::{ListenerId, Stream, StreamId};
