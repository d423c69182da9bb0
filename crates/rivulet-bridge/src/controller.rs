//! Bridge controller
//!
//! One controller per host instance. It moves through
//! `Uninitialized -> Built -> Defaulted -> Active -> Ended`, one step per host
//! lifecycle hook:
//!
//! - [`build_streams`](BridgeController::build_streams) runs the
//!   configuration, collects sources and sinks and queues watch registrations.
//! - [`defaults`](BridgeController::defaults) returns an undefined placeholder
//!   for every sink.
//! - [`activate`](BridgeController::activate) drains the registration queue,
//!   then subscribes sink forwarding. Forwarding relies on replay-on-subscribe
//!   to deliver values produced while the queue drained.
//! - [`terminate`](BridgeController::terminate) ends every source and
//!   releases the host watches it attached. Sinks end through propagation.

use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use rivulet_core::{BridgeSettings, HostValue, ListenerId, Stream, Value};

use crate::config::{ConfigurationNormalizer, StreamsConfig, StreamsDecl};
use crate::diagnostics::{Diagnostic, DiagnosticLog, StreamSetKind};
use crate::errors::BridgeError;
use crate::helper::StreamHelper;
use crate::host::{Host, WatchHandle};
use crate::sets::StreamSet;
use crate::watch::{Activation, ActivationQueue};

/// Lifecycle state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeState {
    /// Created, nothing built yet.
    Uninitialized,
    /// Sources and sinks computed.
    Built,
    /// Property defaults handed out.
    Defaulted,
    /// Watches attached, sinks forwarding.
    Active,
    /// Terminated.
    Ended,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BridgeState::Uninitialized => "uninitialized",
            BridgeState::Built => "built",
            BridgeState::Defaulted => "defaulted",
            BridgeState::Active => "active",
            BridgeState::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Result of [`BridgeController::build_streams`].
#[derive(Debug, Clone, Default)]
pub struct BuiltStreams {
    /// Final source set
    pub sources: StreamSet,
    /// Final sink set
    pub sinks: StreamSet,
}

/// What [`BridgeController::activate`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Host watches attached
    pub watching: usize,
    /// Sources aliasing external streams
    pub bypassed: usize,
    /// Sources with nothing to watch
    pub unbound: usize,
    /// Sinks forwarding onto host properties
    pub forwarded: usize,
}

/// Orchestrates the stream graph of one host.
pub struct BridgeController {
    host: Rc<dyn Host>,
    config: Option<StreamsConfig>,
    settings: BridgeSettings,
    state: BridgeState,
    sources: StreamSet,
    sinks: StreamSet,
    queue: ActivationQueue,
    forwarding: Vec<(Stream<Value>, ListenerId)>,
    watches: Vec<WatchHandle>,
    diagnostics: DiagnosticLog,
}

impl BridgeController {
    /// Controller for `host` with validated `settings`.
    pub fn new(
        host: Rc<dyn Host>,
        config: Option<StreamsConfig>,
        settings: BridgeSettings,
    ) -> Result<Self, BridgeError> {
        settings.validate()?;
        Ok(Self::assemble(host, config, settings))
    }

    /// Controller for `host` with default settings.
    pub fn with_defaults(host: Rc<dyn Host>, config: Option<StreamsConfig>) -> Self {
        Self::assemble(host, config, BridgeSettings::default())
    }

    fn assemble(host: Rc<dyn Host>, config: Option<StreamsConfig>, settings: BridgeSettings) -> Self {
        let capacity = settings
            .record_diagnostics
            .then_some(settings.max_recorded_diagnostics);
        Self {
            host,
            config,
            settings,
            state: BridgeState::Uninitialized,
            sources: StreamSet::new(),
            sinks: StreamSet::new(),
            queue: ActivationQueue::new(),
            forwarding: Vec::new(),
            watches: Vec::new(),
            diagnostics: DiagnosticLog::new(capacity),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Source set.
    pub fn sources(&self) -> &StreamSet {
        &self.sources
    }

    /// Sink set.
    pub fn sinks(&self) -> &StreamSet {
        &self.sinks
    }

    /// Source stream by name.
    pub fn source(&self, name: &str) -> Option<&Stream<Value>> {
        self.sources.get_stream(name)
    }

    /// Sink stream by name.
    pub fn sink(&self, name: &str) -> Option<&Stream<Value>> {
        self.sinks.get_stream(name)
    }

    /// Recorded diagnostics, oldest first.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.entries()
    }

    /// Settings in use.
    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Registrations waiting for activation.
    pub fn pending_registrations(&self) -> usize {
        self.queue.len()
    }

    fn expect_state(&self, operation: &'static str, expected: BridgeState) -> Result<(), BridgeError> {
        if self.state != expected {
            return Err(BridgeError::phase(self.host.identity(), operation, self.state));
        }
        Ok(())
    }

    fn transition(&mut self, next: BridgeState) {
        tracing::debug!(
            host = %self.host.identity(),
            from = %self.state,
            to = %next,
            "bridge state transition"
        );
        self.state = next;
    }

    /// Run the configuration and compute the source and sink sets.
    ///
    /// Fails only when the configuration has an unsupported shape. Missing or
    /// malformed returned values are reported as diagnostics.
    pub fn build_streams(&mut self) -> Result<BuiltStreams, BridgeError> {
        self.expect_state("build_streams", BridgeState::Uninitialized)?;

        let host = Rc::clone(&self.host);
        let Some(normalized) = ConfigurationNormalizer::normalize(self.config.take(), &*host)? else {
            self.transition(BridgeState::Built);
            return Ok(BuiltStreams::default());
        };

        let helper = StreamHelper::new(&*host);
        let StreamsDecl { sources, sinks } = normalized(&*host, &helper);
        let (queue, named) = helper.into_parts();
        self.queue = queue;

        let identity = host.identity();
        let mut sources = self.returned_or_empty(&identity, StreamSetKind::Sources, sources);
        for name in sources.absorb(named.clone()) {
            // The shadowed source is no longer reachable from the source set.
            if let Some(orphan) = named.get_stream(&name) {
                orphan.end();
                self.queue
                    .retain(|registration| !registration.target().ptr_eq(orphan));
            }
            self.diagnostics.report(Diagnostic::SourceShadowed {
                host: identity.clone(),
                name,
            });
        }
        let mut sinks = self.returned_or_empty(&identity, StreamSetKind::Sinks, sinks);
        self.drop_reserved_sinks(&identity, &mut sinks);

        self.check_streams(&identity, StreamSetKind::Sources, &sources);
        self.check_streams(&identity, StreamSetKind::Sinks, &sinks);

        self.sources = sources;
        self.sinks = sinks;
        tracing::debug!(
            host = %identity,
            sources = self.sources.len(),
            sinks = self.sinks.len(),
            registrations = self.queue.len(),
            "streams built"
        );
        self.transition(BridgeState::Built);

        Ok(BuiltStreams {
            sources: self.sources.clone(),
            sinks: self.sinks.clone(),
        })
    }

    fn returned_or_empty(
        &mut self,
        host: &str,
        part: StreamSetKind,
        returned: Option<StreamSet>,
    ) -> StreamSet {
        returned.unwrap_or_else(|| {
            self.diagnostics.report(Diagnostic::MissingReturn {
                host: host.to_string(),
                part,
            });
            StreamSet::new()
        })
    }

    fn drop_reserved_sinks(&mut self, host: &str, sinks: &mut StreamSet) {
        let prefix = self.settings.reserved_prefix.clone();
        let reserved: Vec<String> = sinks
            .names()
            .filter(|name| name.starts_with(prefix.as_str()))
            .map(str::to_string)
            .collect();
        for name in reserved {
            sinks.remove(&name);
            self.diagnostics.report(Diagnostic::ReservedName {
                host: host.to_string(),
                name,
                prefix: prefix.clone(),
            });
        }
    }

    // Non-stream entries stay in place.
    fn check_streams(&mut self, host: &str, set: StreamSetKind, streams: &StreamSet) {
        for (name, value) in streams.iter() {
            if value.capability().is_none() {
                self.diagnostics.report(Diagnostic::NonStreamValue {
                    host: host.to_string(),
                    set,
                    name: name.to_string(),
                    found: value.kind(),
                });
            }
        }
    }

    /// Initial host property values: an undefined placeholder per sink.
    pub fn defaults(&mut self) -> Result<IndexMap<String, HostValue>, BridgeError> {
        self.expect_state("defaults", BridgeState::Built)?;
        let defaults = self
            .sinks
            .names()
            .map(|name| (name.to_string(), HostValue::Undefined))
            .collect();
        self.transition(BridgeState::Defaulted);
        Ok(defaults)
    }

    /// Attach every queued watch, in registration order, then forward every
    /// sink onto the host property of the same name.
    pub fn activate(&mut self) -> Result<ActivationReport, BridgeError> {
        self.expect_state("activate", BridgeState::Defaulted)?;
        let mut report = ActivationReport::default();

        let host = Rc::clone(&self.host);
        for registration in self.queue.drain() {
            match registration.activate(&*host, &self.settings) {
                Activation::Watching(handle) => {
                    self.watches.push(handle);
                    report.watching += 1;
                }
                Activation::Bypassed => report.bypassed += 1,
                Activation::Unbound => report.unbound += 1,
            }
        }
        tracing::debug!(
            host = %host.identity(),
            watching = report.watching,
            bypassed = report.bypassed,
            unbound = report.unbound,
            "activation queue drained"
        );

        let identity = host.identity();
        let weak_host: Weak<dyn Host> = Rc::downgrade(&host);
        let sinks = self.sinks.clone();
        for (name, value) in sinks.iter() {
            let Some(stream) = value.as_stream() else {
                self.diagnostics.report(Diagnostic::NonStreamSink {
                    host: identity.clone(),
                    name: name.to_string(),
                });
                continue;
            };
            let listener = forward(weak_host.clone(), name.to_string());
            let id = stream.subscribe(listener);
            self.forwarding.push((stream.clone(), id));
            report.forwarded += 1;
        }

        self.transition(BridgeState::Active);
        Ok(report)
    }

    /// End every source stream and detach every host watch. Accepted in any
    /// state; repeated calls do nothing.
    pub fn terminate(&mut self) -> Result<(), BridgeError> {
        if self.state == BridgeState::Ended {
            return Ok(());
        }
        for (_, value) in self.sources.iter() {
            if let Some(stream) = value.capability() {
                stream.end();
            }
        }
        // Sinks not derived from any source would otherwise keep forwarding.
        for (stream, id) in self.forwarding.drain(..) {
            stream.unsubscribe(id);
        }
        for handle in self.watches.drain(..) {
            self.host.unwatch(handle);
        }
        self.queue.clear();
        self.transition(BridgeState::Ended);
        Ok(())
    }
}

fn forward(host: Weak<dyn Host>, name: String) -> impl Fn(&Value) + 'static {
    move |value: &Value| match host.upgrade() {
        Some(host) => host.write(&name, value.clone()),
        None => tracing::trace!(sink = %name, "host dropped, value not forwarded"),
    }
}

impl fmt::Debug for BridgeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeController")
            .field("host", &self.host.identity())
            .field("state", &self.state)
            .field("sources", &self.sources.names().collect::<Vec<_>>())
            .field("sinks", &self.sinks.names().collect::<Vec<_>>())
            .field("pending", &self.queue.len())
            .finish()
    }
}
