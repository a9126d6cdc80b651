//! Notification messages and delivery results.

use std::fmt;

use desk_core::{Ticket, TicketId};
use serde::{Deserialize, Serialize};

/// Why a notification was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A `notify` action of an automation rule.
    RuleAction,
    /// An escalation rule fired.
    Escalation,
    /// An approver has a decision to make.
    ApprovalRequired,
    /// An approval request reached its outcome.
    ApprovalDecided,
}

impl NotificationKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RuleAction => "rule_action",
            Self::Escalation => "escalation",
            Self::ApprovalRequired => "approval_required",
            Self::ApprovalDecided => "approval_decided",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message about a ticket for one or more people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Ticket the message is about.
    pub ticket_id: TicketId,
    /// Display reference (`TKT-000042`).
    pub reference: String,
    /// Ticket subject.
    pub subject: String,
    /// Why it was raised.
    pub kind: NotificationKind,
    /// User names or e-mail addresses.
    pub recipients: Vec<String>,
    /// Message text.
    pub message: String,
    /// Rule name or subsystem that raised it.
    pub source: String,
}

impl Notification {
    /// Creates a notification about a ticket with no recipients yet.
    #[must_use]
    pub fn for_ticket(ticket: &Ticket, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket.id,
            reference: ticket.id.to_string(),
            subject: ticket.subject.clone(),
            kind,
            recipients: Vec::new(),
            message: message.into(),
            source: String::new(),
        }
    }

    /// Adds a recipient, ignoring blanks and duplicates.
    #[must_use]
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        let recipient = recipient.into().trim().to_string();
        if !recipient.is_empty() && !self.recipients.contains(&recipient) {
            self.recipients.push(recipient);
        }
        self
    }

    /// Adds several recipients.
    #[must_use]
    pub fn with_recipients<I, S>(self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        recipients
            .into_iter()
            .fold(self, |n, r| n.with_recipient(r))
    }

    /// Sets the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// Result of sending a notification through one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResult {
    /// Whether the notification was delivered.
    pub success: bool,
    /// The channel that processed this notification.
    pub channel: String,
    /// Optional message or error description.
    pub message: Option<String>,
    /// Recipients the channel actually delivered to.
    pub delivered_to: Vec<String>,
}

impl NotificationResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(channel: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: None,
            delivered_to: Vec::new(),
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: Some(message.into()),
            delivered_to: Vec::new(),
        }
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Records who received the message.
    #[must_use]
    pub fn with_delivered_to(mut self, recipients: Vec<String>) -> Self {
        self.delivered_to = recipients;
        self
    }
}
