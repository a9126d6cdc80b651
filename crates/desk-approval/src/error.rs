//! Error types for the desk-approval crate.

use desk_core::{DeskError, TicketId, TicketStatus};
use thiserror::Error;
use uuid::Uuid;

use crate::request::{ApprovalStage, ApprovalStatus};

/// Errors that can occur in the approval workflow.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// No request with this ID.
    #[error("approval request not found: {0}")]
    RequestNotFound(Uuid),

    /// The ticket already has an open request.
    #[error("{ticket} already has an open approval request ({request})")]
    AlreadyPending {
        /// The ticket.
        ticket: TicketId,
        /// The open request.
        request: Uuid,
    },

    /// The actor may not act on the current step.
    #[error("'{actor}' is not the {stage} approver of this request")]
    NotAnApprover {
        /// Who tried to decide.
        actor: String,
        /// The step waiting for a decision.
        stage: ApprovalStage,
    },

    /// The request is no longer open.
    #[error("approval request {id} is already {status}")]
    AlreadyDecided {
        /// Request identifier.
        id: Uuid,
        /// Its final status.
        status: ApprovalStatus,
    },

    /// The directory has no approver for a stage.
    #[error("no {stage} found for '{user}'")]
    MissingApprover {
        /// The stage without an approver.
        stage: ApprovalStage,
        /// The user (or department) looked up.
        user: String,
    },

    /// The ticket cannot enter an approval.
    #[error("{ticket} is {status} and cannot be sent for approval")]
    TicketNotActive {
        /// The ticket.
        ticket: TicketId,
        /// Its current status.
        status: TicketStatus,
    },

    /// The ticket left `pending_approval` while its request was open.
    #[error("{ticket} is {status}, not pending approval; cancel the request instead")]
    NotPendingApproval {
        /// The ticket.
        ticket: TicketId,
        /// Its current status.
        status: TicketStatus,
    },

    /// The ticket passed in is not the one the request belongs to.
    #[error("approval request {request} belongs to {expected}, not {actual}")]
    TicketMismatch {
        /// Request identifier.
        request: Uuid,
        /// The request's ticket.
        expected: TicketId,
        /// The ticket that was passed in.
        actual: TicketId,
    },

    /// Ticket error.
    #[error(transparent)]
    Ticket(#[from] DeskError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ApprovalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for approval operations.
pub type Result<T> = std::result::Result<T, ApprovalError>;
