//! Host property values
//!
//! A host property holds either nothing yet, plain data, or a stream. Source
//! and sink sets use the same representation so that a misconfigured entry can
//! be reported without being coerced.

use std::fmt;

use crate::reactive::{Stream, StreamCapability};

/// Dynamic payload carried by host properties and bridge streams.
pub type Value = serde_json::Value;

/// Content of a host property or of a source/sink set entry.
#[derive(Clone, Default)]
pub enum HostValue {
    /// Placeholder installed before the first real value arrives.
    #[default]
    Undefined,
    /// Plain, non-stream data.
    Data(Value),
    /// A stream of values.
    Stream(Stream<Value>),
}

impl HostValue {
    /// The stream held by this value, if it is one.
    pub fn as_stream(&self) -> Option<&Stream<Value>> {
        match self {
            HostValue::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// The stream capability of this value, if it exposes one.
    pub fn capability(&self) -> Option<&dyn StreamCapability<Value>> {
        self.as_stream()
            .map(|stream| stream as &dyn StreamCapability<Value>)
    }

    /// Whether this value is the undefined placeholder.
    pub fn is_undefined(&self) -> bool {
        matches!(self, HostValue::Undefined)
    }

    /// Short description of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Data(Value::Null) => "null",
            HostValue::Data(Value::Bool(_)) => "boolean",
            HostValue::Data(Value::Number(_)) => "number",
            HostValue::Data(Value::String(_)) => "string",
            HostValue::Data(Value::Array(_)) => "array",
            HostValue::Data(Value::Object(_)) => "object",
            HostValue::Stream(_) => "stream",
        }
    }

    /// Plain-data view: the data itself, or a stream's current value.
    pub fn snapshot(&self) -> Option<Value> {
        match self {
            HostValue::Undefined => None,
            HostValue::Data(value) => Some(value.clone()),
            HostValue::Stream(stream) => stream.current(),
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Undefined, HostValue::Undefined) => true,
            (HostValue::Data(a), HostValue::Data(b)) => a == b,
            (HostValue::Stream(a), HostValue::Stream(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => f.write_str("Undefined"),
            HostValue::Data(value) => f.debug_tuple("Data").field(value).finish(),
            HostValue::Stream(stream) => f.debug_tuple("Stream").field(&stream.id()).finish(),
        }
    }
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        HostValue::Data(value)
    }
}

impl From<Stream<Value>> for HostValue {
    fn from(stream: Stream<Value>) -> Self {
        HostValue::Stream(stream)
    }
}

impl From<&Stream<Value>> for HostValue {
    fn from(stream: &Stream<Value>) -> Self {
        HostValue::Stream(stream.clone())
    }
}
