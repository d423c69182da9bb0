//! Common imports for hosts and configurations

pub use crate::config::{ConfigSlot, StreamsConfig, StreamsDecl};
pub use crate::controller::{ActivationReport, BridgeController, BridgeState};
pub use crate::diagnostics::Diagnostic;
pub use crate::errors::BridgeError;
pub use crate::helper::StreamHelper;
pub use crate::host::{Host, HostProperties, HostWatcher, WatchCallback, WatchHandle};
pub use crate::lifecycle::{StreamsLifecycle, StreamsView};
pub use crate::sets::StreamSet;
pub use crate::watch::{WatchExpression, WatchOptions};
pub use rivulet_core::{BridgeSettings, HostValue, Stream, Value};
