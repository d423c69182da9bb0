//! Watch registrations and the deferred activation queue
//!
//! Sources are declared while the host is still being constructed, before it
//! can be watched. Each declaration records a [`WatchRegistration`] in an
//! [`ActivationQueue`]; the controller drains the queue once, when the host
//! has finished constructing.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use rivulet_core::{BridgeSettings, Stream, Value};

use crate::host::{Host, HostProperties, WatchCallback, WatchHandle};

/// Evaluates a watched expression against the host.
pub type Evaluator = Rc<dyn Fn(&dyn HostProperties) -> Value>;

/// Replaces the default "push into the source" watch handler.
pub type WatchHandler = Rc<dyn Fn(&Stream<Value>, Value)>;

/// What a source watches on its host.
#[derive(Clone)]
pub enum WatchExpression {
    /// A property by name.
    Property(String),
    /// A dotted path into a property's data.
    Path(String),
    /// A function evaluated against the host.
    Evaluator(Evaluator),
    /// No watch at all; the source is fed programmatically.
    Disabled,
}

impl WatchExpression {
    /// Build an evaluator expression.
    pub fn evaluator(f: impl Fn(&dyn HostProperties) -> Value + 'static) -> Self {
        WatchExpression::Evaluator(Rc::new(f))
    }

    /// The property name, for `Property` expressions.
    pub fn property_name(&self) -> Option<&str> {
        match self {
            WatchExpression::Property(name) => Some(name),
            _ => None,
        }
    }

    /// Evaluate the expression against `host` right now.
    pub fn evaluate(&self, host: &dyn HostProperties) -> Option<Value> {
        match self {
            WatchExpression::Property(name) => host.read(name).and_then(|v| v.snapshot()),
            WatchExpression::Path(path) => host.read_path(path),
            WatchExpression::Evaluator(f) => Some(f(host)),
            WatchExpression::Disabled => None,
        }
    }
}

impl fmt::Debug for WatchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchExpression::Property(name) => f.debug_tuple("Property").field(name).finish(),
            WatchExpression::Path(path) => f.debug_tuple("Path").field(path).finish(),
            WatchExpression::Evaluator(_) => f.write_str("Evaluator(..)"),
            WatchExpression::Disabled => f.write_str("Disabled"),
        }
    }
}

impl From<&str> for WatchExpression {
    fn from(name: &str) -> Self {
        WatchExpression::Property(name.to_string())
    }
}

impl From<String> for WatchExpression {
    fn from(name: String) -> Self {
        WatchExpression::Property(name)
    }
}

/// Options passed to the host watch.
#[derive(Clone, Default)]
pub struct WatchOptions {
    /// Push the current value synchronously when the watch is attached.
    pub immediate: bool,
    /// Notify on nested changes inside the watched value.
    pub deep: bool,
    /// Custom handler for watched values.
    pub handler: Option<WatchHandler>,
}

impl WatchOptions {
    /// Options with `immediate` set.
    pub fn immediate() -> Self {
        Self {
            immediate: true,
            ..Self::default()
        }
    }

    /// Set `deep`.
    pub fn deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    /// Install a custom handler. It receives the source and each watched value.
    pub fn with_handler(mut self, handler: impl Fn(&Stream<Value>, Value) + 'static) -> Self {
        self.handler = Some(Rc::new(handler));
        self
    }
}

impl fmt::Debug for WatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchOptions")
            .field("immediate", &self.immediate)
            .field("deep", &self.deep)
            .field("handler", &self.handler.as_ref().map(|_| ".."))
            .finish()
    }
}

/// How a registration feeds its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationMode {
    /// Attach a host watch on activation.
    Watch,
    /// The source aliases an external stream; activation does nothing.
    Bypass,
}

/// Outcome of activating one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// A host watch was attached.
    Watching(WatchHandle),
    /// Bypass source, nothing to attach.
    Bypassed,
    /// The expression is disabled or names nothing on the host; the source is
    /// only fed programmatically.
    Unbound,
}

/// A deferred binding of a watch expression to a source stream.
pub struct WatchRegistration {
    expression: WatchExpression,
    options: WatchOptions,
    target: Stream<Value>,
    mode: RegistrationMode,
}

impl WatchRegistration {
    /// Registration that watches `expression` and feeds `target`.
    pub fn watch(expression: WatchExpression, options: WatchOptions, target: Stream<Value>) -> Self {
        Self {
            expression,
            options,
            target,
            mode: RegistrationMode::Watch,
        }
    }

    /// Registration for a source that aliases an external stream.
    pub fn bypass(expression: WatchExpression, target: Stream<Value>) -> Self {
        Self {
            expression,
            options: WatchOptions::default(),
            target,
            mode: RegistrationMode::Bypass,
        }
    }

    /// Registration mode.
    pub fn mode(&self) -> RegistrationMode {
        self.mode
    }

    /// The source this registration feeds.
    pub fn target(&self) -> &Stream<Value> {
        &self.target
    }

    /// Attach to the host watch mechanism.
    pub fn activate(self, host: &dyn Host, settings: &BridgeSettings) -> Activation {
        if self.mode == RegistrationMode::Bypass {
            return Activation::Bypassed;
        }
        let bound = match &self.expression {
            WatchExpression::Disabled => false,
            WatchExpression::Property(name) => {
                settings.watch_unknown_properties || host.has_property(name)
            }
            WatchExpression::Path(_) | WatchExpression::Evaluator(_) => true,
        };
        if !bound {
            tracing::trace!(
                host = %host.identity(),
                expression = ?self.expression,
                "source left unbound"
            );
            return Activation::Unbound;
        }

        let callback = feed(self.target, self.options.handler.clone());
        let handle = host.watch(&self.expression, callback, &self.options);
        Activation::Watching(handle)
    }
}

impl fmt::Debug for WatchRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRegistration")
            .field("expression", &self.expression)
            .field("options", &self.options)
            .field("target", &self.target.id())
            .field("mode", &self.mode)
            .finish()
    }
}

fn feed(target: Stream<Value>, handler: Option<WatchHandler>) -> WatchCallback {
    match handler {
        Some(handler) => Box::new(move |value| handler(&target, value)),
        None => Box::new(move |value| {
            tracing::trace!(source = %target.id(), "watch push");
            target.push(value);
        }),
    }
}

/// Ordered registrations awaiting activation.
#[derive(Debug, Default)]
pub struct ActivationQueue {
    pending: VecDeque<WatchRegistration>,
}

impl ActivationQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a registration.
    pub fn push(&mut self, registration: WatchRegistration) {
        self.pending.push_back(registration);
    }

    /// Keep only the registrations matching `keep`, preserving order.
    pub fn retain(&mut self, keep: impl FnMut(&WatchRegistration) -> bool) {
        self.pending.retain(keep);
    }

    /// Number of pending registrations.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending registration in registration order, leaving the
    /// queue empty.
    pub fn drain(&mut self) -> impl Iterator<Item = WatchRegistration> + '_ {
        self.pending.drain(..)
    }

    /// Drop every pending registration.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_from_str() {
        let expr = WatchExpression::from("count");
        assert_eq!(expr.property_name(), Some("count"));
        assert_eq!(format!("{expr:?}"), "Property(\"count\")");
    }

    #[test]
    fn test_options_builder() {
        let options = WatchOptions::immediate().deep(true);
        assert!(options.immediate);
        assert!(options.deep);
        assert!(options.handler.is_none());
    }

    #[test]
    fn test_queue_drains_in_order_once() {
        let mut queue = ActivationQueue::new();
        let first = Stream::new();
        let second = Stream::new();
        queue.push(WatchRegistration::watch("a".into(), WatchOptions::default(), first.clone()));
        queue.push(WatchRegistration::bypass("b".into(), second.clone()));

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(drained[0].target().ptr_eq(&first));
        assert_eq!(drained[1].mode(), RegistrationMode::Bypass);
        assert!(queue.is_empty());
        assert_eq!(queue.drain().count(), 0);
    }

    #[test]
    fn test_queue_retain_drops_registrations_for_a_target() {
        let mut queue = ActivationQueue::new();
        let kept = Stream::new();
        let dropped = Stream::new();
        queue.push(WatchRegistration::watch("a".into(), WatchOptions::default(), dropped.clone()));
        queue.push(WatchRegistration::watch("b".into(), WatchOptions::default(), kept.clone()));

        queue.retain(|registration| !registration.target().ptr_eq(&dropped));
        let remaining: Vec<_> = queue.drain().collect();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].target().ptr_eq(&kept));
    }

    #[test]
    fn test_custom_handler_receives_target() {
        let target = Stream::new();
        let handler: WatchHandler = Rc::new(|stream: &Stream<Value>, value: Value| {
            stream.push(serde_json::json!({ "wrapped": value }))
        });
        let callback = feed(target.clone(), Some(handler));
        callback(serde_json::json!(1));
        assert_eq!(target.current(), Some(serde_json::json!({ "wrapped": 1 })));
    }
}
