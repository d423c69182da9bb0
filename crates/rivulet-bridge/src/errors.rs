//! Bridge errors
//!
//! Only a malformed configuration shape aborts setup. Everything a
//! configuration returns is handled with diagnostics instead, see
//! [`crate::diagnostics`].

use rivulet_core::RivuletError;

use crate::controller::BridgeState;

/// Errors raised by the bridge controller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The configuration does not match any supported shape
    #[error("Invalid streams configuration on {host}: {detail}")]
    ConfigurationShape {
        /// Identity of the host the configuration belongs to
        host: String,
        /// What is wrong with the shape
        detail: String,
    },

    /// A lifecycle operation was called in the wrong phase
    #[error("{operation} called on {host} while {state}")]
    InvalidPhase {
        /// Identity of the host
        host: String,
        /// Operation that was attempted
        operation: &'static str,
        /// State the controller was in
        state: BridgeState,
    },

    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] RivuletError),
}

impl BridgeError {
    /// Create a configuration shape error
    pub fn shape(host: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ConfigurationShape {
            host: host.into(),
            detail: detail.into(),
        }
    }

    /// Create an invalid phase error
    pub fn phase(host: impl Into<String>, operation: &'static str, state: BridgeState) -> Self {
        Self::InvalidPhase {
            host: host.into(),
            operation,
            state,
        }
    }
}
