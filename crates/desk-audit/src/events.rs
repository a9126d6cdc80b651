//! Audit event types.
//!
//! An [`AuditEvent`] wraps an [`AuditKind`] with the envelope every entry of
//! the trail shares: id, time, severity, ticket and actor.

use std::fmt;

use chrono::{DateTime, Utc};
use desk_core::{Priority, TicketId};
pub use desk_core::FieldChange;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuditError, Result};

/// Severity level for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine activity.
    Info = 0,
    /// Worth a look (escalations, approval decisions).
    Notice = 1,
    /// Something did not go as configured.
    Warning = 2,
    /// Something failed.
    Error = 3,
}

impl Severity {
    /// Returns the string representation of this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditKind {
    /// A ticket was raised.
    TicketCreated {
        /// Ticket subject.
        subject: String,
        /// Priority at intake.
        priority: Priority,
    },
    /// Fields of a ticket were changed by a person.
    TicketUpdated {
        /// The changes.
        changes: Vec<FieldChange>,
    },
    /// A comment was added.
    CommentAdded {
        /// Whether the comment is an internal note.
        internal: bool,
    },
    /// An automation or escalation rule changed a ticket.
    RuleApplied {
        /// Rule identifier.
        rule_id: String,
        /// Rule name.
        rule_name: String,
        /// `automation` or `escalation`.
        rule_kind: String,
        /// The changes the rule made.
        changes: Vec<FieldChange>,
    },
    /// An action of a rule could not be applied.
    RuleFailed {
        /// Rule identifier.
        rule_id: String,
        /// Rule name.
        rule_name: String,
        /// The failing action.
        action: String,
        /// Why it failed.
        reason: String,
    },
    /// A ticket was escalated.
    Escalated {
        /// Rule identifier.
        rule_id: String,
        /// Rule name.
        rule_name: String,
        /// Escalation level after the escalation.
        level: u32,
    },
    /// An approval request was opened.
    ApprovalRequested {
        /// Approval request id.
        request_id: Uuid,
        /// First approver.
        line_manager: String,
        /// Second approver.
        head_of_department: String,
    },
    /// An approver decided.
    ApprovalDecided {
        /// Approval request id.
        request_id: Uuid,
        /// Stage decided.
        stage: String,
        /// `approved`, `rejected` or `cancelled`.
        decision: String,
    },
    /// A notification went out.
    NotificationSent {
        /// Channel name.
        channel: String,
        /// Recipients.
        recipients: Vec<String>,
    },
    /// A notification could not be delivered to a channel.
    NotificationFailed {
        /// Channel name.
        channel: String,
        /// Why it failed.
        reason: String,
    },
}

impl AuditKind {
    /// Returns the event type as a string.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::TicketCreated { .. } => "ticket_created",
            Self::TicketUpdated { .. } => "ticket_updated",
            Self::CommentAdded { .. } => "comment_added",
            Self::RuleApplied { .. } => "rule_applied",
            Self::RuleFailed { .. } => "rule_failed",
            Self::Escalated { .. } => "escalated",
            Self::ApprovalRequested { .. } => "approval_requested",
            Self::ApprovalDecided { .. } => "approval_decided",
            Self::NotificationSent { .. } => "notification_sent",
            Self::NotificationFailed { .. } => "notification_failed",
        }
    }

    /// The severity an event of this kind gets unless overridden.
    #[must_use]
    pub const fn default_severity(&self) -> Severity {
        match self {
            Self::TicketCreated { .. }
            | Self::TicketUpdated { .. }
            | Self::CommentAdded { .. }
            | Self::RuleApplied { .. }
            | Self::ApprovalRequested { .. }
            | Self::NotificationSent { .. } => Severity::Info,
            Self::Escalated { .. } | Self::ApprovalDecided { .. } => Severity::Notice,
            Self::RuleFailed { .. } => Severity::Warning,
            Self::NotificationFailed { .. } => Severity::Error,
        }
    }
}

/// An entry of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Severity level.
    pub severity: Severity,
    /// Ticket the event concerns.
    pub ticket_id: Option<TicketId>,
    /// User, agent or subsystem (`automation`, `escalation`) that acted.
    pub actor: String,
    /// What happened.
    #[serde(flatten)]
    pub kind: AuditKind,
}

impl AuditEvent {
    /// Creates an event with the kind's default severity.
    #[must_use]
    pub fn new(
        kind: AuditKind,
        ticket_id: Option<TicketId>,
        actor: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp,
            severity: kind.default_severity(),
            ticket_id,
            actor: actor.into(),
            kind,
        }
    }

    /// Overrides the severity.
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// A ticket was raised.
    #[must_use]
    pub fn ticket_created(
        ticket_id: TicketId,
        requester: impl Into<String>,
        subject: impl Into<String>,
        priority: Priority,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            AuditKind::TicketCreated {
                subject: subject.into(),
                priority,
            },
            Some(ticket_id),
            requester,
            at,
        )
    }

    /// A person changed fields of a ticket.
    #[must_use]
    pub fn ticket_updated(
        ticket_id: TicketId,
        actor: impl Into<String>,
        changes: Vec<FieldChange>,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(AuditKind::TicketUpdated { changes }, Some(ticket_id), actor, at)
    }

    /// A comment was added.
    #[must_use]
    pub fn comment_added(
        ticket_id: TicketId,
        author: impl Into<String>,
        internal: bool,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(AuditKind::CommentAdded { internal }, Some(ticket_id), author, at)
    }

    /// A rule changed a ticket.
    #[must_use]
    pub fn rule_applied(
        ticket_id: TicketId,
        rule_id: impl Into<String>,
        rule_name: impl Into<String>,
        rule_kind: impl Into<String>,
        changes: Vec<FieldChange>,
        at: DateTime<Utc>,
    ) -> Self {
        let rule_kind = rule_kind.into();
        let actor = rule_kind.clone();
        Self::new(
            AuditKind::RuleApplied {
                rule_id: rule_id.into(),
                rule_name: rule_name.into(),
                rule_kind,
                changes,
            },
            Some(ticket_id),
            actor,
            at,
        )
    }

    /// An action of a rule failed.
    #[must_use]
    pub fn rule_failed(
        ticket_id: TicketId,
        rule_id: impl Into<String>,
        rule_name: impl Into<String>,
        action: impl Into<String>,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            AuditKind::RuleFailed {
                rule_id: rule_id.into(),
                rule_name: rule_name.into(),
                action: action.into(),
                reason: reason.into(),
            },
            Some(ticket_id),
            "rules",
            at,
        )
    }

    /// A ticket was escalated.
    #[must_use]
    pub fn escalated(
        ticket_id: TicketId,
        rule_id: impl Into<String>,
        rule_name: impl Into<String>,
        level: u32,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            AuditKind::Escalated {
                rule_id: rule_id.into(),
                rule_name: rule_name.into(),
                level,
            },
            Some(ticket_id),
            "escalation",
            at,
        )
    }

    /// An approval request was opened.
    #[must_use]
    pub fn approval_requested(
        ticket_id: TicketId,
        requested_by: impl Into<String>,
        request_id: Uuid,
        line_manager: impl Into<String>,
        head_of_department: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            AuditKind::ApprovalRequested {
                request_id,
                line_manager: line_manager.into(),
                head_of_department: head_of_department.into(),
            },
            Some(ticket_id),
            requested_by,
            at,
        )
    }

    /// An approver decided.
    #[must_use]
    pub fn approval_decided(
        ticket_id: TicketId,
        approver: impl Into<String>,
        request_id: Uuid,
        stage: impl Into<String>,
        decision: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            AuditKind::ApprovalDecided {
                request_id,
                stage: stage.into(),
                decision: decision.into(),
            },
            Some(ticket_id),
            approver,
            at,
        )
    }

    /// A notification went out through a channel.
    #[must_use]
    pub fn notification_sent(
        ticket_id: TicketId,
        channel: impl Into<String>,
        recipients: Vec<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            AuditKind::NotificationSent {
                channel: channel.into(),
                recipients,
            },
            Some(ticket_id),
            "notifications",
            at,
        )
    }

    /// A channel failed to deliver a notification.
    #[must_use]
    pub fn notification_failed(
        ticket_id: TicketId,
        channel: impl Into<String>,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            AuditKind::NotificationFailed {
                channel: channel.into(),
                reason: reason.into(),
            },
            Some(ticket_id),
            "notifications",
            at,
        )
    }

    /// Returns the event type as a string.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    /// Serializes the event to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(AuditError::from)
    }
}
