//! Error types for the desk-core crate.

use thiserror::Error;

use crate::ticket::{TicketId, TicketStatus};

/// Errors that can occur while handling tickets.
#[derive(Debug, Error)]
pub enum DeskError {
    /// Ticket was not found.
    #[error("ticket not found: {0}")]
    TicketNotFound(TicketId),

    /// Ticket failed validation.
    #[error("invalid ticket: {0}")]
    InvalidTicket(String),

    /// Status change is not allowed from the current status.
    #[error("cannot move ticket from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: TicketStatus,
        /// Requested status.
        to: TicketStatus,
    },

    /// Unknown priority name.
    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    /// Unknown status name.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Ticket reference could not be parsed.
    #[error("invalid ticket id: {0}")]
    InvalidTicketId(String),

    /// Category is not registered.
    #[error("category not found: {0}")]
    CategoryNotFound(String),
}

/// Result type for ticket operations.
pub type Result<T> = std::result::Result<T, DeskError>;
