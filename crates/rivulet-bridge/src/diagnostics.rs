//! Non-fatal configuration diagnostics
//!
//! Anything a configuration returns that the bridge cannot use is reported
//! here and setup continues with a best-effort result.

use std::fmt;

/// Which set a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSetKind {
    /// The source set.
    Sources,
    /// The sink set.
    Sinks,
}

impl fmt::Display for StreamSetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSetKind::Sources => f.write_str("sources"),
            StreamSetKind::Sinks => f.write_str("sinks"),
        }
    }
}

/// A recoverable anomaly found while building or activating the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The configuration returned nothing for a set; an empty set is used.
    MissingReturn {
        /// Host identity
        host: String,
        /// Set that was missing
        part: StreamSetKind,
    },
    /// A set entry is not a stream. It is kept as-is.
    NonStreamValue {
        /// Host identity
        host: String,
        /// Set containing the entry
        set: StreamSetKind,
        /// Entry name
        name: String,
        /// What was found instead
        found: &'static str,
    },
    /// A sink name uses the reserved prefix and was dropped.
    ReservedName {
        /// Host identity
        host: String,
        /// Sink name
        name: String,
        /// Reserved prefix
        prefix: String,
    },
    /// A non-stream sink could not be forwarded to the host.
    NonStreamSink {
        /// Host identity
        host: String,
        /// Sink name
        name: String,
    },
    /// A named source was replaced by a returned source of the same name.
    SourceShadowed {
        /// Host identity
        host: String,
        /// Source name
        name: String,
    },
}

impl Diagnostic {
    /// Host the diagnostic is about.
    pub fn host(&self) -> &str {
        match self {
            Diagnostic::MissingReturn { host, .. }
            | Diagnostic::NonStreamValue { host, .. }
            | Diagnostic::ReservedName { host, .. }
            | Diagnostic::NonStreamSink { host, .. }
            | Diagnostic::SourceShadowed { host, .. } => host,
        }
    }

    fn emit(&self) {
        match self {
            Diagnostic::SourceShadowed { host, name } => {
                tracing::debug!(host = %host, source = %name, "{}", self);
            }
            Diagnostic::MissingReturn { host, part } => {
                tracing::warn!(host = %host, part = %part, "{}", self);
            }
            Diagnostic::NonStreamValue { host, set, name, .. } => {
                tracing::warn!(host = %host, set = %set, name = %name, "{}", self);
            }
            Diagnostic::ReservedName { host, name, .. } | Diagnostic::NonStreamSink { host, name } => {
                tracing::warn!(host = %host, sink = %name, "{}", self);
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingReturn { host, part } => {
                write!(f, "streams configuration of {host} returned no {part}")
            }
            Diagnostic::NonStreamValue {
                host,
                set,
                name,
                found,
            } => write!(f, "{set} entry '{name}' of {host} is not a stream (found {found})"),
            Diagnostic::ReservedName { host, name, prefix } => write!(
                f,
                "sink '{name}' of {host} uses the reserved prefix '{prefix}' and was dropped"
            ),
            Diagnostic::NonStreamSink { host, name } => {
                write!(f, "sink '{name}' of {host} is not a stream and is not forwarded")
            }
            Diagnostic::SourceShadowed { host, name } => {
                write!(f, "named source '{name}' of {host} replaced by a returned source")
            }
        }
    }
}

/// Bounded record of diagnostics for one controller.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
    capacity: Option<usize>,
    dropped: usize,
}

impl DiagnosticLog {
    /// Log keeping at most `capacity` entries. `None` keeps nothing.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Emit a diagnostic and record it if there is room.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        match self.capacity {
            Some(capacity) if self.entries.len() < capacity => self.entries.push(diagnostic),
            _ => self.dropped += 1,
        }
    }

    /// Recorded diagnostics, oldest first.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Diagnostics reported but not recorded.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(part: StreamSetKind) -> Diagnostic {
        Diagnostic::MissingReturn {
            host: "Counter".into(),
            part,
        }
    }

    #[test]
    fn test_display_names_host() {
        let d = Diagnostic::NonStreamValue {
            host: "Counter".into(),
            set: StreamSetKind::Sinks,
            name: "total".into(),
            found: "number",
        };
        assert_eq!(d.host(), "Counter");
        assert_eq!(
            d.to_string(),
            "sinks entry 'total' of Counter is not a stream (found number)"
        );
    }

    #[test]
    fn test_log_respects_capacity() {
        let mut log = DiagnosticLog::new(Some(1));
        log.report(missing(StreamSetKind::Sources));
        log.report(missing(StreamSetKind::Sinks));
        assert_eq!(log.entries(), &[missing(StreamSetKind::Sources)]);
        assert_eq!(log.dropped(), 1);
    }

    #[test]
    fn test_disabled_log_records_nothing() {
        let mut log = DiagnosticLog::new(None);
        log.report(missing(StreamSetKind::Sinks));
        assert!(log.entries().is_empty());
        assert_eq!(log.dropped(), 1);
    }
}
