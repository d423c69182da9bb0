//! Source factory handed to configurations

use std::cell::RefCell;

use rivulet_core::{HostValue, Stream, Value};

use crate::host::Host;
use crate::sets::StreamSet;
use crate::watch::{ActivationQueue, WatchExpression, WatchOptions, WatchRegistration};

/// Creates sources for a configuration while the host is being built.
///
/// Every source is returned immediately and holds no value until the bridge
/// is activated. The watches backing them are only queued here.
pub struct StreamHelper<'a> {
    host: &'a dyn Host,
    queue: RefCell<ActivationQueue>,
    named: RefCell<StreamSet>,
}

impl<'a> StreamHelper<'a> {
    /// Helper for `host`.
    pub fn new(host: &'a dyn Host) -> Self {
        Self {
            host,
            queue: RefCell::new(ActivationQueue::new()),
            named: RefCell::new(StreamSet::new()),
        }
    }

    /// The host sources are created for.
    pub fn host(&self) -> &'a dyn Host {
        self.host
    }

    /// Create a source fed by watching `expression`.
    ///
    /// If the expression names an external input of the host that already
    /// holds a stream, the source aliases that stream instead and no watch
    /// is attached.
    pub fn from_watch(
        &self,
        expression: impl Into<WatchExpression>,
        options: WatchOptions,
    ) -> Stream<Value> {
        let expression = expression.into();

        if let Some(external) = self.external_stream(&expression) {
            let source = external
                .capability()
                .map(|cap| cap.derive(Box::new(Value::clone)))
                .unwrap_or_default();
            tracing::debug!(
                host = %self.host.identity(),
                expression = ?expression,
                "aliasing external stream"
            );
            self.queue
                .borrow_mut()
                .push(WatchRegistration::bypass(expression, source.clone()));
            return source;
        }

        let source = Stream::new();
        self.queue
            .borrow_mut()
            .push(WatchRegistration::watch(expression, options, source.clone()));
        source
    }

    /// Create a source registered under `name`.
    ///
    /// Named sources join the source set even when the configuration does
    /// not return them. A returned source with the same name takes
    /// precedence.
    pub fn create_source(
        &self,
        name: impl Into<String>,
        expression: impl Into<WatchExpression>,
        options: WatchOptions,
    ) -> Stream<Value> {
        let source = self.from_watch(expression, options);
        self.named.borrow_mut().insert(name, &source);
        source
    }

    /// Sources created with [`create_source`](Self::create_source) so far.
    pub fn named_sources(&self) -> StreamSet {
        self.named.borrow().clone()
    }

    /// Number of queued registrations.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub(crate) fn into_parts(self) -> (ActivationQueue, StreamSet) {
        (self.queue.into_inner(), self.named.into_inner())
    }

    fn external_stream(&self, expression: &WatchExpression) -> Option<HostValue> {
        let name = expression.property_name()?;
        if !self.host.has_prop(name) {
            return None;
        }
        self.host
            .read(name)
            .filter(|value| value.capability().is_some())
    }
}
