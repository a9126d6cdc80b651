//! Error types for the desk-rules crate.

use desk_core::DeskError;
use thiserror::Error;

/// Errors that can occur in the rule engine.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Rule definition is invalid.
    #[error("invalid rule: {reason}")]
    InvalidRule {
        /// The reason the rule is invalid.
        reason: String,
    },

    /// A condition cannot be evaluated as written.
    #[error("invalid condition on {field}: {reason}")]
    InvalidCondition {
        /// The field the condition reads.
        field: String,
        /// The reason the condition is invalid.
        reason: String,
    },

    /// An action definition is invalid.
    #[error("invalid {action} action: {reason}")]
    InvalidAction {
        /// Action type.
        action: String,
        /// The reason the action is invalid.
        reason: String,
    },

    /// Applying an action to a ticket failed.
    #[error("{action} failed: {reason}")]
    ActionFailed {
        /// Action type.
        action: String,
        /// The reason it failed.
        reason: String,
    },

    /// Rule with the given ID was not found.
    #[error("rule not found: {id}")]
    RuleNotFound {
        /// The rule ID that was not found.
        id: String,
    },

    /// A rule with the same ID is already registered.
    #[error("rule with ID '{id}' already exists")]
    DuplicateRule {
        /// The duplicated rule ID.
        id: String,
    },

    /// Ticket operation failed.
    #[error(transparent)]
    Ticket(#[from] DeskError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
