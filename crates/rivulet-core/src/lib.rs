//! Rivulet Core - Stream primitives and host value model
//!
//! This crate provides the foundation the stream bridge is built on. It has no
//! knowledge of hosts, watch mechanisms or lifecycles.
//!
//! # Modules
//!
//! - [`reactive`]: `Stream<T>`, a single-threaded push stream with synchronous,
//!   glitch-free propagation, the derivation combinators (`map`, `scan`,
//!   `filter`, `combine`, `combine_all`, `merge`) and end propagation.
//! - [`value`]: `HostValue`, the content of a host property (undefined, plain
//!   data, or a stream).
//! - [`settings`]: `BridgeSettings`, loaded from TOML and environment.
//! - [`errors`]: `RivuletError` and the crate `Result` alias.

#![forbid(unsafe_code)]

/// Unified error handling
pub mod errors;

/// Push streams and combinators
pub mod reactive;

/// Bridge settings (reserved names, diagnostics, watch policy)
pub mod settings;

/// Host property values
pub mod value;

pub use errors::{Result, RivuletError};
pub use reactive::{ListenerId, Stream, StreamCapability, StreamId};
pub use settings::BridgeSettings;
pub use value::{HostValue, Value};
