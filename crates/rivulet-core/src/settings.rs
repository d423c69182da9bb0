//! Bridge settings
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `RIVULET_*` environment variables. Validation runs after every layer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, RivuletError};

const ENV_PREFIX: &str = "RIVULET_";

/// Tunables shared by every bridge controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Prefix reserved for the bridge's own host properties. Sink names
    /// starting with it are dropped.
    pub reserved_prefix: String,
    /// Keep diagnostics on the controller in addition to logging them.
    pub record_diagnostics: bool,
    /// Upper bound on recorded diagnostics per controller.
    pub max_recorded_diagnostics: usize,
    /// Register watches for names the host does not expose instead of
    /// treating them as unbound sources.
    pub watch_unknown_properties: bool,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            reserved_prefix: "$".to_string(),
            record_diagnostics: true,
            max_recorded_diagnostics: 64,
            watch_unknown_properties: false,
        }
    }
}

impl BridgeSettings {
    /// Check invariants.
    pub fn validate(&self) -> Result<()> {
        if self.reserved_prefix.is_empty() {
            return Err(RivuletError::settings("reserved_prefix must not be empty"));
        }
        if self.record_diagnostics && self.max_recorded_diagnostics == 0 {
            return Err(RivuletError::settings(
                "max_recorded_diagnostics must be positive when recording is enabled",
            ));
        }
        Ok(())
    }

    /// Parse settings from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let settings: Self = toml::from_str(input)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Apply `RIVULET_*` overrides from the process environment.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `RIVULET_*` overrides from the given variables.
    ///
    /// Unknown `RIVULET_*` keys are ignored; malformed values are an error.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match field.to_ascii_lowercase().as_str() {
                "reserved_prefix" => self.reserved_prefix = value.to_string(),
                "record_diagnostics" => self.record_diagnostics = parse_flag(field, value)?,
                "max_recorded_diagnostics" => {
                    self.max_recorded_diagnostics = value.parse().map_err(|e| {
                        RivuletError::settings(format!("{ENV_PREFIX}{field}: {e}"))
                    })?;
                }
                "watch_unknown_properties" => {
                    self.watch_unknown_properties = parse_flag(field, value)?
                }
                _ => {
                    tracing::debug!(key = %key.as_ref(), "ignoring unknown settings override");
                }
            }
        }
        self.validate()
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RivuletError::settings(format!(
            "{ENV_PREFIX}{field}: expected a boolean, got '{other}'"
        ))),
    }
}
