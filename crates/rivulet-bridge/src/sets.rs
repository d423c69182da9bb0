//! Named source and sink sets

use indexmap::IndexMap;
use rivulet_core::{HostValue, Stream, Value};

/// Ordered mapping from name to host value.
///
/// Entries are expected to be streams, but any [`HostValue`] is accepted so
/// that a misconfigured entry can be reported and kept as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSet {
    entries: IndexMap<String, HostValue>,
}

impl StreamSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an entry, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<HostValue>) -> Option<HostValue> {
        self.entries.insert(name.into(), value.into())
    }

    /// Entry by name.
    pub fn get(&self, name: &str) -> Option<&HostValue> {
        self.entries.get(name)
    }

    /// Stream entry by name. `None` for missing or non-stream entries.
    pub fn get_stream(&self, name: &str) -> Option<&Stream<Value>> {
        self.get(name).and_then(HostValue::as_stream)
    }

    /// Whether an entry exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Remove an entry, preserving the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<HostValue> {
        self.entries.shift_remove(name)
    }

    /// Append entries of `other` whose names are not present yet.
    ///
    /// Returns the names that were present with a different value; those
    /// keep the entry already in `self`.
    pub fn absorb(&mut self, other: StreamSet) -> Vec<String> {
        let mut shadowed = Vec::new();
        for (name, value) in other.entries {
            match self.entries.get(&name) {
                Some(existing) if *existing != value => shadowed.push(name),
                Some(_) => {}
                None => {
                    self.entries.insert(name, value);
                }
            }
        }
        shadowed
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HostValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<HostValue>> FromIterator<(K, V)> for StreamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = StreamSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_is_insertion_order() {
        let set = StreamSet::new()
            .with("b", Stream::of(json!(1)))
            .with("a", json!(2))
            .with("c", Stream::<Value>::new());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_get_stream_skips_data() {
        let set = StreamSet::new().with("s", Stream::of(json!(1))).with("d", json!(1));
        assert!(set.get_stream("s").is_some());
        assert!(set.get_stream("d").is_none());
        assert!(set.contains("d"));
        assert!(set.get_stream("missing").is_none());
    }

    #[test]
    fn test_absorb_keeps_existing_entries() {
        let shared = Stream::of(json!(0));
        let mut returned = StreamSet::new().with("a", &shared).with("b", json!(1));
        let named = StreamSet::new()
            .with("a", &shared)
            .with("b", Stream::of(json!(2)))
            .with("c", Stream::of(json!(3)));

        let shadowed = returned.absorb(named);
        assert_eq!(shadowed, vec!["b".to_string()]);
        assert_eq!(returned.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(returned.get("b"), Some(&HostValue::from(json!(1))));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut set: StreamSet = [("x", json!(1)), ("y", json!(2)), ("z", json!(3))]
            .into_iter()
            .collect();
        assert!(set.remove("y").is_some());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["x", "z"]);
        assert_eq!(set.len(), 2);
    }
}
