//! Host lifecycle adapter
//!
//! Maps the four host hooks onto a [`BridgeController`]:
//!
//! | hook             | controller call   |
//! |------------------|-------------------|
//! | `before_create`  | `build_streams`   |
//! | `data`           | `defaults`        |
//! | `created`        | `activate`        |
//! | `before_destroy` | `terminate`       |

use std::rc::Rc;

use indexmap::IndexMap;
use rivulet_core::{BridgeSettings, HostValue, Stream, Value};

use crate::config::StreamsConfig;
use crate::controller::{ActivationReport, BridgeController, BridgeState};
use crate::diagnostics::Diagnostic;
use crate::errors::BridgeError;
use crate::host::Host;
use crate::sets::StreamSet;

/// Convenience view of a host's streams, available after `before_create`.
///
/// Sources are reachable by name; the full sets are reachable as
/// `$sources` and `$sinks` through [`StreamsView::lookup`].
#[derive(Debug, Clone, Default)]
pub struct StreamsView {
    sources: StreamSet,
    sinks: StreamSet,
}

/// Entry returned by [`StreamsView::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEntry<'a> {
    /// A source by name
    Source(&'a HostValue),
    /// The whole source set
    Sources(&'a StreamSet),
    /// The whole sink set
    Sinks(&'a StreamSet),
}

impl StreamsView {
    /// Source stream by name.
    pub fn source(&self, name: &str) -> Option<&Stream<Value>> {
        self.sources.get_stream(name)
    }

    /// All sources.
    pub fn sources(&self) -> &StreamSet {
        &self.sources
    }

    /// All sinks.
    pub fn sinks(&self) -> &StreamSet {
        &self.sinks
    }

    /// Resolve a view key: `$sources`, `$sinks`, or a source name.
    pub fn lookup(&self, key: &str) -> Option<ViewEntry<'_>> {
        match key {
            "$sources" => Some(ViewEntry::Sources(&self.sources)),
            "$sinks" => Some(ViewEntry::Sinks(&self.sinks)),
            name => self.sources.get(name).map(ViewEntry::Source),
        }
    }
}

/// Drives a [`BridgeController`] from host lifecycle hooks.
#[derive(Debug)]
pub struct StreamsLifecycle {
    controller: BridgeController,
    view: Option<StreamsView>,
}

impl StreamsLifecycle {
    /// Adapter for `host` with default settings. `None` yields an inert bridge.
    pub fn new(host: Rc<dyn Host>, config: Option<StreamsConfig>) -> Self {
        Self {
            controller: BridgeController::with_defaults(host, config),
            view: None,
        }
    }

    /// Adapter for `host` with explicit settings.
    pub fn with_settings(
        host: Rc<dyn Host>,
        config: Option<StreamsConfig>,
        settings: BridgeSettings,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            controller: BridgeController::new(host, config, settings)?,
            view: None,
        })
    }

    /// Before-construction hook.
    pub fn before_create(&mut self) -> Result<&StreamsView, BridgeError> {
        let built = self.controller.build_streams()?;
        Ok(self.view.insert(StreamsView {
            sources: built.sources,
            sinks: built.sinks,
        }))
    }

    /// Default-data hook. The result is merged into the host's initial
    /// properties.
    pub fn data(&mut self) -> Result<IndexMap<String, HostValue>, BridgeError> {
        self.controller.defaults()
    }

    /// Post-construction hook.
    pub fn created(&mut self) -> Result<ActivationReport, BridgeError> {
        self.controller.activate()
    }

    /// Pre-teardown hook.
    pub fn before_destroy(&mut self) -> Result<(), BridgeError> {
        self.controller.terminate()
    }

    /// Streams view, once built.
    pub fn streams(&self) -> Option<&StreamsView> {
        self.view.as_ref()
    }

    /// Lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.controller.state()
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.controller.diagnostics()
    }

    /// Underlying controller.
    pub fn controller(&self) -> &BridgeController {
        &self.controller
    }
}
