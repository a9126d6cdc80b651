//! Error types for the desk-notify crate.

use thiserror::Error;

/// Errors that can occur while delivering notifications.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A channel was configured with invalid settings.
    #[error("invalid channel configuration: {reason}")]
    InvalidChannel {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// A channel could not deliver a notification.
    #[error("delivery through {channel} failed: {reason}")]
    DeliveryFailed {
        /// Channel name.
        channel: String,
        /// The reason delivery failed.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
