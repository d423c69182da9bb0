//! In-memory host with a batched watch mechanism
//!
//! Property changes made through [`FakeHost::set_data`] or bridge writes are
//! not observed by watchers until [`FakeHost::flush`] runs, mirroring hosts
//! that batch change notifications.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use rivulet_bridge::host::{HostProperties, HostWatcher, WatchCallback, WatchHandle};
use rivulet_bridge::watch::{WatchExpression, WatchOptions};
use rivulet_core::{HostValue, Stream, Value};

/// Upper bound on flush passes before a watch cycle is assumed.
const MAX_FLUSH_PASSES: usize = 100;

struct Watcher {
    handle: WatchHandle,
    expression: WatchExpression,
    callback: Rc<dyn Fn(Value)>,
    last: Option<Value>,
}

/// A watch as it was attached.
#[derive(Debug, Clone)]
pub struct WatchRecord {
    /// Watch handle
    pub handle: WatchHandle,
    /// Debug rendering of the expression
    pub expression: String,
    /// `immediate` option
    pub immediate: bool,
    /// `deep` option
    pub deep: bool,
}

/// Test host: props, data, property writes and watches, all in memory.
pub struct FakeHost {
    identity: String,
    props: RefCell<IndexMap<String, HostValue>>,
    data: RefCell<IndexMap<String, HostValue>>,
    watchers: RefCell<Vec<Watcher>>,
    watch_log: RefCell<Vec<WatchRecord>>,
    writes: RefCell<Vec<(String, Value)>>,
    next_handle: Cell<u64>,
}

impl FakeHost {
    /// Empty host named `identity`.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            props: RefCell::new(IndexMap::new()),
            data: RefCell::new(IndexMap::new()),
            watchers: RefCell::new(Vec::new()),
            watch_log: RefCell::new(Vec::new()),
            writes: RefCell::new(Vec::new()),
            next_handle: Cell::new(1),
        }
    }

    /// Declare an external input.
    pub fn with_prop(self, name: &str, value: impl Into<HostValue>) -> Self {
        self.set_prop(name, value);
        self
    }

    /// Declare a data property.
    pub fn with_data(self, name: &str, value: Value) -> Self {
        self.set_data(name, value);
        self
    }

    /// Declare an external input holding a stream, returning the stream.
    pub fn stream_prop(&self, name: &str, initial: Option<Value>) -> Stream<Value> {
        let stream = match initial {
            Some(value) => Stream::of(value),
            None => Stream::new(),
        };
        self.set_prop(name, &stream);
        stream
    }

    /// Set an external input. Watchers see it on the next flush.
    pub fn set_prop(&self, name: &str, value: impl Into<HostValue>) {
        self.props.borrow_mut().insert(name.to_string(), value.into());
    }

    /// Set a data property. Watchers see it on the next flush.
    pub fn set_data(&self, name: &str, value: Value) {
        self.data
            .borrow_mut()
            .insert(name.to_string(), HostValue::Data(value));
    }

    /// Merge initial data, as a host does with the bridge defaults.
    pub fn merge_data(&self, defaults: IndexMap<String, HostValue>) {
        let mut data = self.data.borrow_mut();
        for (name, value) in defaults {
            data.entry(name).or_insert(value);
        }
    }

    /// Current content of a data property.
    pub fn data(&self, name: &str) -> Option<HostValue> {
        self.data.borrow().get(name).cloned()
    }

    /// Current plain value of a property.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.read(name).and_then(|value| value.snapshot())
    }

    /// Every property write made through the host interface, in order.
    pub fn writes(&self) -> Vec<(String, Value)> {
        self.writes.borrow().clone()
    }

    /// Writes made to `name`, in order.
    pub fn writes_to(&self, name: &str) -> Vec<Value> {
        self.writes
            .borrow()
            .iter()
            .filter(|(written, _)| written == name)
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Number of attached watches.
    pub fn watch_count(&self) -> usize {
        self.watchers.borrow().len()
    }

    /// Attached watches in attachment order.
    pub fn watch_log(&self) -> Vec<WatchRecord> {
        self.watch_log.borrow().clone()
    }

    /// Deliver pending changes to watchers, in attachment order, until no
    /// watched value changes. Returns the number of callbacks run.
    pub fn flush(&self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_FLUSH_PASSES {
            let changed = self.flush_pass();
            if changed == 0 {
                return delivered;
            }
            delivered += changed;
        }
        panic!("{}: watchers did not settle after {MAX_FLUSH_PASSES} passes", self.identity);
    }

    fn flush_pass(&self) -> usize {
        let count = self.watchers.borrow().len();
        let mut changed = 0;
        for index in 0..count {
            let (expression, last) = {
                let watchers = self.watchers.borrow();
                (watchers[index].expression.clone(), watchers[index].last.clone())
            };
            let current = expression.evaluate(self);
            if current == last {
                continue;
            }
            let (handle, callback) = {
                let mut watchers = self.watchers.borrow_mut();
                watchers[index].last = current.clone();
                (watchers[index].handle, Rc::clone(&watchers[index].callback))
            };
            tracing::trace!(host = %self.identity, handle = handle.0, "watch notify");
            callback(current.unwrap_or(Value::Null));
            changed += 1;
        }
        changed
    }

    fn read_from(map: &RefCell<IndexMap<String, HostValue>>, name: &str) -> Option<HostValue> {
        map.borrow().get(name).cloned()
    }
}

impl HostProperties for FakeHost {
    fn identity(&self) -> String {
        self.identity.clone()
    }

    fn has_prop(&self, name: &str) -> bool {
        self.props.borrow().contains_key(name)
    }

    fn has_property(&self, name: &str) -> bool {
        self.has_prop(name) || self.data.borrow().contains_key(name)
    }

    fn read(&self, name: &str) -> Option<HostValue> {
        Self::read_from(&self.props, name).or_else(|| Self::read_from(&self.data, name))
    }

    fn write(&self, name: &str, value: Value) {
        self.writes
            .borrow_mut()
            .push((name.to_string(), value.clone()));
        self.set_data(name, value);
    }
}

impl HostWatcher for FakeHost {
    fn watch(
        &self,
        expression: &WatchExpression,
        callback: WatchCallback,
        options: &WatchOptions,
    ) -> WatchHandle {
        let handle = WatchHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);

        let current = expression.evaluate(self);
        let callback: Rc<dyn Fn(Value)> = Rc::from(callback);
        self.watchers.borrow_mut().push(Watcher {
            handle,
            expression: expression.clone(),
            callback: Rc::clone(&callback),
            last: current.clone(),
        });
        self.watch_log.borrow_mut().push(WatchRecord {
            handle,
            expression: format!("{expression:?}"),
            immediate: options.immediate,
            deep: options.deep,
        });

        if options.immediate {
            callback(current.unwrap_or(Value::Null));
        }
        handle
    }

    fn unwatch(&self, handle: WatchHandle) {
        self.watchers
            .borrow_mut()
            .retain(|watcher| watcher.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder() -> (Rc<RefCell<Vec<Value>>>, WatchCallback) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, Box::new(move |v| sink.borrow_mut().push(v)))
    }

    #[test]
    fn test_immediate_watch_fires_on_attach() {
        let host = FakeHost::new("Host").with_data("x", json!(5));
        let (seen, callback) = recorder();
        host.watch(&"x".into(), callback, &WatchOptions::immediate());
        assert_eq!(*seen.borrow(), vec![json!(5)]);
    }

    #[test]
    fn test_changes_wait_for_flush() {
        let host = FakeHost::new("Host").with_data("x", json!(1));
        let (seen, callback) = recorder();
        host.watch(&"x".into(), callback, &WatchOptions::default());

        host.set_data("x", json!(2));
        assert!(seen.borrow().is_empty());
        assert_eq!(host.flush(), 1);
        assert_eq!(*seen.borrow(), vec![json!(2)]);
        assert_eq!(host.flush(), 0);
    }

    #[test]
    fn test_unwatch_stops_notifications() {
        let host = FakeHost::new("Host").with_data("x", json!(1));
        let (seen, callback) = recorder();
        let handle = host.watch(&"x".into(), callback, &WatchOptions::default());
        host.unwatch(handle);
        host.unwatch(handle);

        host.set_data("x", json!(2));
        assert_eq!(host.flush(), 0);
        assert!(seen.borrow().is_empty());
        assert_eq!(host.watch_count(), 0);
        assert_eq!(host.watch_log().len(), 1);
    }

    #[test]
    fn test_path_watch() {
        let host = FakeHost::new("Host").with_data("user", json!({ "name": "ada" }));
        let (seen, callback) = recorder();
        host.watch(
            &WatchExpression::Path("user.name".into()),
            callback,
            &WatchOptions::immediate().deep(true),
        );
        host.set_data("user", json!({ "name": "grace" }));
        host.flush();
        assert_eq!(*seen.borrow(), vec![json!("ada"), json!("grace")]);
        assert!(host.watch_log()[0].deep);
    }

    #[test]
    fn test_write_is_logged_and_readable() {
        let host = FakeHost::new("Host");
        host.write("total", json!(3));
        assert_eq!(host.value("total"), Some(json!(3)));
        assert_eq!(host.writes(), vec![("total".to_string(), json!(3))]);
    }
}
