//! Host capabilities
//!
//! The bridge never reaches into a host directly. It is handed an object
//! implementing these traits, which lets tests drive it with a fake host.

use rivulet_core::{HostValue, Value};

use crate::watch::{WatchExpression, WatchOptions};

/// Callback invoked by a host watch with the newly evaluated value.
pub type WatchCallback = Box<dyn Fn(Value)>;

/// Opaque handle for an attached watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(pub u64);

/// Read and write access to a host's properties.
pub trait HostProperties {
    /// Name of the host instance, used in errors and diagnostics.
    fn identity(&self) -> String;

    /// Whether `name` is an externally supplied input ("prop") of the host.
    fn has_prop(&self, name: &str) -> bool;

    /// Whether `name` is any readable property of the host.
    fn has_property(&self, name: &str) -> bool;

    /// Current content of a property.
    fn read(&self, name: &str) -> Option<HostValue>;

    /// Evaluate a dotted path such as `user.address.city`.
    ///
    /// The first segment names a property; further segments index into its
    /// data (object keys, or array positions).
    fn read_path(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let head = segments.next()?;
        let mut current = self.read(head)?.snapshot()?;
        for segment in segments {
            current = match current {
                Value::Object(mut map) => map.remove(segment)?,
                Value::Array(mut items) => {
                    let index: usize = segment.parse().ok()?;
                    if index >= items.len() {
                        return None;
                    }
                    items.swap_remove(index)
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Assign a mutable property.
    fn write(&self, name: &str, value: Value);
}

/// A host's change-notification mechanism.
pub trait HostWatcher {
    /// Attach a watch. When `options.immediate` is set the callback runs
    /// with the current value before `watch` returns.
    fn watch(
        &self,
        expression: &WatchExpression,
        callback: WatchCallback,
        options: &WatchOptions,
    ) -> WatchHandle;

    /// Detach a watch. Unknown or already released handles are ignored.
    fn unwatch(&self, handle: WatchHandle);
}

/// Everything the bridge needs from a host.
pub trait Host: HostProperties + HostWatcher {}

impl<T: HostProperties + HostWatcher + ?Sized> Host for T {}
