//! Error types for the coordination layer
//!
//! There is deliberately no error taxonomy of our own: every transport,
//! negotiation, or media failure originates in the vendor SDK and is
//! surfaced unchanged as [`SdkError`]. The remaining variants cover the
//! handful of conditions the coordinator guards locally (missing session or
//! publisher, bad configuration).

use thiserror::Error;

/// Result type for coordinator operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// A failure reported by the underlying vendor SDK, passed through as-is
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} ({code}): {message}")]
pub struct SdkError {
    /// Vendor error name (e.g. "OT_CONNECT_FAILED")
    pub name: String,
    /// Vendor numeric error code
    pub code: u32,
    /// Human-readable message from the SDK
    pub message: String,
}

impl SdkError {
    /// Create a new SDK error
    pub fn new(name: impl Into<String>, code: u32, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code,
            message: message.into(),
        }
    }
}

/// Errors that can occur in the session coordinator
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Vendor SDK failure, surfaced unchanged
    #[error("SDK error: {0}")]
    Sdk(#[from] SdkError),

    /// Operation requires a connected session
    #[error("Not connected: {message}")]
    NotConnected {
        /// What was attempted without a session
        message: String,
    },

    /// Operation requires an active publisher
    #[error("No active publisher")]
    NoPublisher,

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// What was wrong with the configuration
        message: String,
    },
}

impl CoordinatorError {
    /// Create a not-connected error
    pub fn not_connected(message: impl Into<String>) -> Self {
        Self::NotConnected {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
