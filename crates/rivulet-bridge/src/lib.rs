//! Rivulet Bridge - Push streams on top of watched host properties
//!
//! A host (a component instance with watchable, mutable properties) declares a
//! streams configuration. The bridge derives source streams from the host's
//! watched expressions, lets the configuration derive sink streams from them,
//! forwards sink values onto host properties, and ends the whole graph when
//! the host is destroyed.
//!
//! # Modules
//!
//! - [`host`]: capabilities the bridge needs from a host
//! - [`watch`]: watch expressions, registrations and the activation queue
//! - [`config`]: configuration shapes and their normalization
//! - [`helper`]: the source factory handed to configurations
//! - [`controller`]: the lifecycle state machine
//! - [`lifecycle`]: host hook adapter and the streams view
//! - [`diagnostics`]: non-fatal configuration problems
//!
//! # Usage
//!
//! ```rust,ignore
//! use rivulet_bridge::prelude::*;
//!
//! let config = StreamsConfig::with_helper(|_host, helper| {
//!     let count = helper.from_watch("count", WatchOptions::immediate());
//!     let doubled = count.map(|v| Value::from(v.as_i64().unwrap_or(0) * 2));
//!     Some(StreamsDecl::new(
//!         StreamSet::new().with("count", &count),
//!         StreamSet::new().with("doubled", doubled),
//!     ))
//! });
//!
//! let mut lifecycle = StreamsLifecycle::new(host, Some(config));
//! lifecycle.before_create()?;
//! let defaults = lifecycle.data()?;
//! lifecycle.created()?;
//! // ...
//! lifecycle.before_destroy()?;
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod errors;
pub mod helper;
pub mod host;
pub mod lifecycle;
pub mod prelude;
pub mod sets;
pub mod watch;

pub use config::{ConfigurationNormalizer, StreamsConfig, StreamsDecl};
pub use controller::{ActivationReport, BridgeController, BridgeState, BuiltStreams};
pub use diagnostics::{Diagnostic, StreamSetKind};
pub use errors::BridgeError;
pub use helper::StreamHelper;
pub use host::{Host, HostProperties, HostWatcher};
pub use lifecycle::{StreamsLifecycle, StreamsView};
pub use sets::StreamSet;
pub use watch::{WatchExpression, WatchOptions};
