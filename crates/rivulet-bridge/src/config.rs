//! Streams configuration shapes
//!
//! Hosts declare their streams in one of several shapes. They are all
//! normalized into a single `(host, helper) -> StreamsDecl` function before
//! the controller uses them.

use std::fmt;
use std::rc::Rc;

use rivulet_core::{HostValue, Value};

use crate::errors::BridgeError;
use crate::helper::StreamHelper;
use crate::host::{Host, HostProperties};
use crate::sets::StreamSet;

/// What a configuration returns. `None` members are reported and replaced
/// by empty sets.
#[derive(Debug, Clone, Default)]
pub struct StreamsDecl {
    /// Returned sources
    pub sources: Option<StreamSet>,
    /// Returned sinks
    pub sinks: Option<StreamSet>,
}

impl StreamsDecl {
    /// Declaration with both sets.
    pub fn new(sources: StreamSet, sinks: StreamSet) -> Self {
        Self {
            sources: Some(sources),
            sinks: Some(sinks),
        }
    }
}

/// Configuration taking only the host.
pub type HostConfigFn = Rc<dyn Fn(&dyn Host) -> Option<StreamsDecl>>;
/// Configuration taking the host and a source factory.
pub type HelperConfigFn = Rc<dyn Fn(&dyn Host, &StreamHelper<'_>) -> Option<StreamsDecl>>;
/// Sources half of a split configuration.
pub type SourcesFn = Rc<dyn Fn(&StreamHelper<'_>) -> Option<StreamSet>>;
/// Sinks half of a split configuration.
pub type SinksFn = Rc<dyn Fn(&StreamSet) -> Option<StreamSet>>;

/// Member of a split configuration as the host declared it.
#[derive(Clone)]
pub enum ConfigSlot<F> {
    /// A function, as expected.
    Callable(F),
    /// Plain data where a function was expected.
    Declared(Value),
}

/// Streams configuration as declared on a host.
#[derive(Clone)]
pub enum StreamsConfig {
    /// `(host) -> {sources, sinks}`
    WithHost(HostConfigFn),
    /// `(host, helper) -> {sources, sinks}`
    WithHelper(HelperConfigFn),
    /// `sources(helper)` and `sinks(sources)`, both required.
    Split {
        /// Sources member
        sources: Option<ConfigSlot<SourcesFn>>,
        /// Sinks member
        sinks: Option<ConfigSlot<SinksFn>>,
    },
}

impl StreamsConfig {
    /// Configuration taking only the host.
    pub fn with_host(f: impl Fn(&dyn Host) -> Option<StreamsDecl> + 'static) -> Self {
        StreamsConfig::WithHost(Rc::new(f))
    }

    /// Configuration taking the host and a source factory.
    pub fn with_helper(
        f: impl Fn(&dyn Host, &StreamHelper<'_>) -> Option<StreamsDecl> + 'static,
    ) -> Self {
        StreamsConfig::WithHelper(Rc::new(f))
    }

    /// Split configuration with both members callable.
    pub fn split(
        sources: impl Fn(&StreamHelper<'_>) -> Option<StreamSet> + 'static,
        sinks: impl Fn(&StreamSet) -> Option<StreamSet> + 'static,
    ) -> Self {
        StreamsConfig::Split {
            sources: Some(ConfigSlot::Callable(Rc::new(sources))),
            sinks: Some(ConfigSlot::Callable(Rc::new(sinks))),
        }
    }
}

impl fmt::Debug for StreamsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn slot<F>(slot: &Option<ConfigSlot<F>>) -> &'static str {
            match slot {
                None => "missing",
                Some(ConfigSlot::Callable(_)) => "callable",
                Some(ConfigSlot::Declared(_)) => "declared",
            }
        }
        match self {
            StreamsConfig::WithHost(_) => f.write_str("WithHost(..)"),
            StreamsConfig::WithHelper(_) => f.write_str("WithHelper(..)"),
            StreamsConfig::Split { sources, sinks } => f
                .debug_struct("Split")
                .field("sources", &slot(sources))
                .field("sinks", &slot(sinks))
                .finish(),
        }
    }
}

/// Canonical configuration function.
pub type NormalizedConfig = Rc<dyn Fn(&dyn Host, &StreamHelper<'_>) -> StreamsDecl>;

/// Turns any [`StreamsConfig`] shape into a [`NormalizedConfig`].
pub struct ConfigurationNormalizer;

impl ConfigurationNormalizer {
    /// Normalize `config` for `host`.
    ///
    /// `Ok(None)` means the host has no streams and the bridge stays inert.
    /// A split configuration with only one member, or with a member that is
    /// not callable, is an error naming the host.
    pub fn normalize<H: HostProperties + ?Sized>(
        config: Option<StreamsConfig>,
        host: &H,
    ) -> Result<Option<NormalizedConfig>, BridgeError> {
        let Some(config) = config else {
            return Ok(None);
        };

        let normalized: NormalizedConfig = match config {
            StreamsConfig::WithHost(f) => {
                Rc::new(move |host: &dyn Host, _: &StreamHelper<'_>| f(host).unwrap_or_default())
            }
            StreamsConfig::WithHelper(f) => {
                Rc::new(move |host: &dyn Host, helper: &StreamHelper<'_>| {
                    f(host, helper).unwrap_or_default()
                })
            }
            StreamsConfig::Split {
                sources: None,
                sinks: None,
            } => return Ok(None),
            StreamsConfig::Split { sources, sinks } => {
                let identity = host.identity();
                let sources = callable(&identity, "sources", sources)?;
                let sinks = callable(&identity, "sinks", sinks)?;
                Rc::new(move |_: &dyn Host, helper: &StreamHelper<'_>| {
                    let returned = sources(helper);
                    let mut visible = returned.clone().unwrap_or_default();
                    visible.absorb(helper.named_sources());
                    StreamsDecl {
                        sources: returned,
                        sinks: sinks(&visible),
                    }
                })
            }
        };
        Ok(Some(normalized))
    }
}

fn callable<F>(
    host: &str,
    member: &str,
    slot: Option<ConfigSlot<F>>,
) -> Result<F, BridgeError> {
    match slot {
        Some(ConfigSlot::Callable(f)) => Ok(f),
        Some(ConfigSlot::Declared(value)) => Err(BridgeError::shape(
            host,
            format!(
                "`{member}` must be a function, found {}",
                HostValue::Data(value).kind()
            ),
        )),
        None => Err(BridgeError::shape(
            host,
            format!("`sources` and `sinks` must both be defined, `{member}` is missing"),
        )),
    }
}
