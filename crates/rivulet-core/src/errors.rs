//! Unified error type for Rivulet core
//!
//! Stream operations never fail; errors only arise from loading and validating
//! settings, or from malformed input handed to the core by a caller.

use serde::{Deserialize, Serialize};

/// Unified error type for core operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum RivuletError {
    /// Invalid input
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Settings could not be loaded or failed validation
    #[error("Settings error: {message}")]
    Settings {
        /// Error message describing the settings problem
        message: String,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl RivuletError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a settings error
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Standard Result type for core operations
pub type Result<T> = std::result::Result<T, RivuletError>;

impl From<toml::de::Error> for RivuletError {
    fn from(err: toml::de::Error) -> Self {
        Self::settings(format!("Invalid TOML: {err}"))
    }
}

impl From<std::io::Error> for RivuletError {
    fn from(err: std::io::Error) -> Self {
        Self::settings(format!("Failed to read settings file: {err}"))
    }
}
