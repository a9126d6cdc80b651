//! Ticket types.
//!
//! This module provides the fundamental types of the help desk:
//! - [`TicketId`]: Numeric ticket identifier with a `TKT-` reference form
//! - [`Priority`]: Ordered urgency of a ticket
//! - [`TicketStatus`]: Lifecycle state and its allowed transitions
//! - [`Ticket`]: A ticket with its comments, tags and SLA due dates
//! - [`NewTicket`]: The intake form a ticket is created from
//! - [`FieldChange`]: One field an edit changed, as recorded in the audit trail

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};

/// Maximum allowed length for ticket subjects.
pub const MAX_SUBJECT_LENGTH: usize = 200;

/// Prefix used when rendering ticket references.
pub const REFERENCE_PREFIX: &str = "TKT-";

/// Unique identifier for a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(u64);

impl TicketId {
    /// Create a `TicketId` from its number.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the ticket number.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Parse a `TicketId` from either `42` or `TKT-000042`.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::InvalidTicketId` if the input is not a ticket number.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(REFERENCE_PREFIX)
            .or_else(|| trimmed.strip_prefix("tkt-"))
            .unwrap_or(trimmed);

        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| DeskError::InvalidTicketId(s.to_string()))
    }
}

impl FromStr for TicketId {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REFERENCE_PREFIX}{:06}", self.0)
    }
}

/// The urgency of a ticket.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal business request.
    #[default]
    Medium,
    /// Blocks someone's work.
    High,
    /// Service down or many people affected.
    Urgent,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Returns the priority as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Returns the rank of this priority (higher = more urgent).
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }

    /// Returns the next priority up, saturating at `Urgent`.
    #[must_use]
    pub const fn raised(&self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Urgent => Self::Urgent,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "normal" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" | "critical" => Ok(Self::Urgent),
            _ => Err(DeskError::InvalidPriority(s.to_string())),
        }
    }
}

/// The lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Waiting in the queue.
    #[default]
    Open,
    /// An agent is working on it.
    InProgress,
    /// Waiting on the approval workflow.
    PendingApproval,
    /// Parked, waiting on the requester or a third party.
    OnHold,
    /// Fixed, waiting to be closed.
    Resolved,
    /// Done.
    Closed,
    /// Refused during approval.
    Rejected,
}

impl TicketStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Open,
        Self::InProgress,
        Self::PendingApproval,
        Self::OnHold,
        Self::Resolved,
        Self::Closed,
        Self::Rejected,
    ];

    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::PendingApproval => "pending_approval",
            Self::OnHold => "on_hold",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true if the ticket still needs work.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Open | Self::InProgress | Self::PendingApproval | Self::OnHold
        )
    }

    /// Returns true if the ticket may move from this status to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        if *self == next {
            return true;
        }

        match self {
            Self::Open => matches!(
                next,
                Self::InProgress
                    | Self::PendingApproval
                    | Self::OnHold
                    | Self::Resolved
                    | Self::Closed
            ),
            Self::InProgress => matches!(
                next,
                Self::Open | Self::PendingApproval | Self::OnHold | Self::Resolved | Self::Closed
            ),
            Self::PendingApproval => matches!(next, Self::Open | Self::Rejected | Self::Closed),
            Self::OnHold => matches!(
                next,
                Self::Open | Self::InProgress | Self::Resolved | Self::Closed
            ),
            Self::Resolved => matches!(next, Self::Open | Self::Closed),
            Self::Closed => matches!(next, Self::Open),
            Self::Rejected => false,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| DeskError::InvalidStatus(s.to_string()))
    }
}

/// A comment on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Who wrote the comment.
    pub author: String,
    /// Comment text.
    pub body: String,
    /// Internal notes are hidden from the requester.
    pub internal: bool,
    /// When the comment was written.
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a public comment.
    #[must_use]
    pub fn public(author: impl Into<String>, body: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            internal: false,
            created_at: at,
        }
    }

    /// Creates an internal note.
    #[must_use]
    pub fn internal(author: impl Into<String>, body: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            internal: true,
            created_at: at,
        }
    }
}

/// A help-desk ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier.
    pub id: TicketId,
    /// One-line summary.
    pub subject: String,
    /// Full description from the requester.
    pub description: String,
    /// User who raised the ticket.
    pub requester: String,
    /// Requester's department, if known.
    pub department: Option<String>,
    /// Category the ticket is filed under.
    pub category: Option<String>,
    /// Current priority.
    pub priority: Priority,
    /// Current status.
    pub status: TicketStatus,
    /// Agent the ticket is assigned to.
    pub assignee: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Additional named fields.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
    /// Conversation and internal notes.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// When the ticket was raised.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// First public reply from someone other than the requester.
    pub first_response_at: Option<DateTime<Utc>>,
    /// When the ticket was last resolved.
    pub resolved_at: Option<DateTime<Utc>>,
    /// First-response SLA deadline.
    pub response_due_at: Option<DateTime<Utc>>,
    /// Resolution SLA deadline.
    pub resolution_due_at: Option<DateTime<Utc>>,
    /// How many times the ticket was escalated.
    #[serde(default)]
    pub escalation_level: u32,
    /// Escalation rules that already fired for this ticket.
    #[serde(default)]
    pub applied_escalations: Vec<String>,
}

/// One field of a ticket that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field name (`priority`, `assignee`, `tags`, `custom.<name>`, ...).
    pub field: String,
    /// Value before the change.
    pub old: Option<String>,
    /// Value after the change.
    pub new: Option<String>,
}

impl FieldChange {
    /// Creates a change record.
    #[must_use]
    pub fn new<O, N>(field: impl Into<String>, old: Option<O>, new: Option<N>) -> Self
    where
        O: Into<String>,
        N: Into<String>,
    {
        Self {
            field: field.into(),
            old: old.map(Into::into),
            new: new.map(Into::into),
        }
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.field,
            self.old.as_deref().unwrap_or("-"),
            self.new.as_deref().unwrap_or("-")
        )
    }
}

impl Ticket {
    /// Returns true if the ticket carries the given tag (case-insensitive).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Returns true if the ticket is still active and past its resolution deadline.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active() && self.resolution_due_at.is_some_and(|due| now > due)
    }

    /// Minutes elapsed since the ticket was raised.
    #[must_use]
    pub fn minutes_since_created(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.created_at).num_minutes()
    }

    /// Minutes elapsed since the last modification.
    #[must_use]
    pub fn minutes_since_updated(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.updated_at).num_minutes()
    }

    /// Returns true if the given escalation rule already fired for this ticket.
    #[must_use]
    pub fn escalation_applied(&self, rule_id: &str) -> bool {
        self.applied_escalations.iter().any(|id| id == rule_id)
    }

    /// Records that the given escalation rule fired.
    pub fn record_escalation(&mut self, rule_id: impl Into<String>) {
        let rule_id = rule_id.into();
        if !self.escalation_applied(&rule_id) {
            self.applied_escalations.push(rule_id);
        }
    }

    /// Moves the ticket to `next`.
    ///
    /// Resolving or closing stamps `resolved_at` (closing keeps an earlier
    /// resolution time); reopening clears it. Returns `false` when the ticket
    /// already had that status.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::InvalidTransition` if the lifecycle forbids the move.
    pub fn transition(&mut self, next: TicketStatus, now: DateTime<Utc>) -> Result<bool> {
        if self.status == next {
            return Ok(false);
        }

        if !self.status.can_transition_to(next) {
            return Err(DeskError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        match next {
            TicketStatus::Resolved => self.resolved_at = Some(now),
            TicketStatus::Closed => {
                self.resolved_at.get_or_insert(now);
            }
            _ if next.is_active() => self.resolved_at = None,
            _ => {}
        }

        self.status = next;
        self.updated_at = now;
        Ok(true)
    }

    /// Appends a comment.
    ///
    /// The first public comment written by someone other than the requester
    /// counts as the first response.
    pub fn add_comment(&mut self, comment: Comment) {
        if !comment.internal
            && comment.author != self.requester
            && self.first_response_at.is_none()
        {
            self.first_response_at = Some(comment.created_at);
        }

        if comment.created_at > self.updated_at {
            self.updated_at = comment.created_at;
        }
        self.comments.push(comment);
    }
}

/// The intake form a ticket is created from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    /// One-line summary.
    pub subject: String,
    /// Full description.
    #[serde(default)]
    pub description: String,
    /// User raising the ticket.
    pub requester: String,
    /// Requester's department.
    #[serde(default)]
    pub department: Option<String>,
    /// Category to file under.
    #[serde(default)]
    pub category: Option<String>,
    /// Requested priority; the category default applies when absent.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Initial tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl NewTicket {
    /// Creates an intake form with the required fields.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        description: impl Into<String>,
        requester: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            requester: requester.into(),
            ..Self::default()
        }
    }

    /// Sets the department.
    #[must_use]
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Validates the form.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::InvalidTicket` if:
    /// - The subject is empty or longer than [`MAX_SUBJECT_LENGTH`]
    /// - The requester is empty
    pub fn validate(&self) -> Result<()> {
        let subject = self.subject.trim();
        if subject.is_empty() {
            return Err(DeskError::InvalidTicket(
                "subject cannot be empty".to_string(),
            ));
        }

        if subject.chars().count() > MAX_SUBJECT_LENGTH {
            return Err(DeskError::InvalidTicket(format!(
                "subject exceeds maximum length of {MAX_SUBJECT_LENGTH} characters"
            )));
        }

        if self.requester.trim().is_empty() {
            return Err(DeskError::InvalidTicket(
                "requester cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    mod id_tests {
        use super::*;
        use test_case::test_case;

        #[test]
        fn id_display_is_padded() {
            assert_eq!(TicketId::new(42).to_string(), "TKT-000042");
            assert_eq!(TicketId::new(1_234_567).to_string(), "TKT-1234567");
        }

        #[test_case("42", 42 ; "bare number")]
        #[test_case("TKT-000042", 42 ; "reference")]
        #[test_case("tkt-7", 7 ; "lowercase prefix")]
        #[test_case(" 9 ", 9 ; "whitespace")]
        fn id_parse(input: &str, expected: u64) {
            assert_eq!(TicketId::parse(input).unwrap(), TicketId::new(expected));
        }

        #[test]
        fn id_parse_invalid() {
            assert!(matches!(
                TicketId::parse("TKT-abc"),
                Err(DeskError::InvalidTicketId(_))
            ));
        }

        #[test]
        fn id_serializes_as_number() {
            let json = serde_json::to_string(&TicketId::new(5)).unwrap();
            assert_eq!(json, "5");
        }
    }

    mod priority_tests {
        use super::*;
        use test_case::test_case;

        #[test]
        fn priority_ordering_follows_rank() {
            for pair in Priority::ALL.windows(2) {
                assert!(pair[0] < pair[1]);
                assert!(pair[0].rank() < pair[1].rank());
            }
        }

        #[test]
        fn priority_raised_saturates() {
            assert_eq!(Priority::Low.raised(), Priority::Medium);
            assert_eq!(Priority::High.raised(), Priority::Urgent);
            assert_eq!(Priority::Urgent.raised(), Priority::Urgent);
        }

        #[test_case("low", Priority::Low)]
        #[test_case("Normal", Priority::Medium)]
        #[test_case("HIGH", Priority::High)]
        #[test_case("critical", Priority::Urgent)]
        fn priority_parse(input: &str, expected: Priority) {
            assert_eq!(input.parse::<Priority>().unwrap(), expected);
        }

        #[test]
        fn priority_parse_invalid() {
            assert!("soonish".parse::<Priority>().is_err());
        }

        #[test]
        fn priority_default() {
            assert_eq!(Priority::default(), Priority::Medium);
        }
    }

    mod status_tests {
        use super::*;
        use test_case::test_case;

        #[test]
        fn status_is_active() {
            assert!(TicketStatus::Open.is_active());
            assert!(TicketStatus::PendingApproval.is_active());
            assert!(TicketStatus::OnHold.is_active());
            assert!(!TicketStatus::Resolved.is_active());
            assert!(!TicketStatus::Closed.is_active());
            assert!(!TicketStatus::Rejected.is_active());
        }

        #[test]
        fn same_status_is_always_allowed() {
            for status in TicketStatus::ALL {
                assert!(status.can_transition_to(status));
            }
        }

        #[test_case(TicketStatus::Open, TicketStatus::Resolved, true)]
        #[test_case(TicketStatus::Resolved, TicketStatus::Open, true ; "reopen")]
        #[test_case(TicketStatus::Closed, TicketStatus::Open, true ; "reopen closed")]
        #[test_case(TicketStatus::Closed, TicketStatus::Resolved, false)]
        #[test_case(TicketStatus::PendingApproval, TicketStatus::InProgress, false)]
        #[test_case(TicketStatus::PendingApproval, TicketStatus::Rejected, true)]
        #[test_case(TicketStatus::Open, TicketStatus::Rejected, false)]
        #[test_case(TicketStatus::Rejected, TicketStatus::Open, false ; "rejected is terminal")]
        fn status_transitions(from: TicketStatus, to: TicketStatus, allowed: bool) {
            assert_eq!(from.can_transition_to(to), allowed);
        }

        #[test_case("in_progress", TicketStatus::InProgress)]
        #[test_case("In Progress", TicketStatus::InProgress)]
        #[test_case("pending-approval", TicketStatus::PendingApproval)]
        #[test_case("closed", TicketStatus::Closed)]
        fn status_parse(input: &str, expected: TicketStatus) {
            assert_eq!(input.parse::<TicketStatus>().unwrap(), expected);
        }

        #[test]
        fn status_serializes_snake_case() {
            let json = serde_json::to_string(&TicketStatus::OnHold).unwrap();
            assert_eq!(json, "\"on_hold\"");
        }
    }

    mod lifecycle_tests {
        use super::*;
        use chrono::{Duration, TimeZone};

        fn t0() -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2026, 1, 12, 8, 30, 0).unwrap()
        }

        fn ticket() -> Ticket {
            Ticket {
                id: TicketId::new(1),
                subject: "Cannot print".to_string(),
                description: String::new(),
                requester: "alice".to_string(),
                department: None,
                category: None,
                priority: Priority::Medium,
                status: TicketStatus::Open,
                assignee: None,
                tags: BTreeSet::new(),
                custom_fields: BTreeMap::new(),
                comments: Vec::new(),
                created_at: t0(),
                updated_at: t0(),
                first_response_at: None,
                resolved_at: None,
                response_due_at: None,
                resolution_due_at: None,
                escalation_level: 0,
                applied_escalations: Vec::new(),
            }
        }

        #[test]
        fn resolve_and_reopen() {
            let mut t = ticket();
            let at = t0() + Duration::hours(2);

            assert!(t.transition(TicketStatus::Resolved, at).unwrap());
            assert_eq!(t.resolved_at, Some(at));
            assert_eq!(t.updated_at, at);

            assert!(t.transition(TicketStatus::Open, at + Duration::hours(1)).unwrap());
            assert!(t.resolved_at.is_none());
        }

        #[test]
        fn close_keeps_resolution_time() {
            let mut t = ticket();
            let resolved = t0() + Duration::hours(1);
            t.transition(TicketStatus::Resolved, resolved).unwrap();
            t.transition(TicketStatus::Closed, resolved + Duration::days(3))
                .unwrap();
            assert_eq!(t.resolved_at, Some(resolved));
        }

        #[test]
        fn same_status_is_noop() {
            let mut t = ticket();
            assert!(!t.transition(TicketStatus::Open, t0() + Duration::hours(1)).unwrap());
            assert_eq!(t.updated_at, t0());
        }

        #[test]
        fn forbidden_transition() {
            let mut t = ticket();
            let result = t.transition(TicketStatus::Rejected, t0());
            assert!(matches!(result, Err(DeskError::InvalidTransition { .. })));
            assert_eq!(t.status, TicketStatus::Open);
        }

        #[test]
        fn first_response_from_agent_only() {
            let mut t = ticket();
            t.add_comment(Comment::public("alice", "any news?", t0() + Duration::minutes(5)));
            assert!(t.first_response_at.is_none());

            t.add_comment(Comment::internal("dave", "checking spooler", t0() + Duration::minutes(6)));
            assert!(t.first_response_at.is_none());

            let reply = t0() + Duration::minutes(7);
            t.add_comment(Comment::public("dave", "restarted the spooler", reply));
            assert_eq!(t.first_response_at, Some(reply));

            t.add_comment(Comment::public("erin", "me too", reply + Duration::minutes(1)));
            assert_eq!(t.first_response_at, Some(reply));
            assert_eq!(t.comments.len(), 4);
        }

        #[test]
        fn escalation_recorded_once() {
            let mut t = ticket();
            t.record_escalation("rule-1");
            t.record_escalation("rule-1");
            assert!(t.escalation_applied("rule-1"));
            assert_eq!(t.applied_escalations.len(), 1);
        }
    }

    mod new_ticket_tests {
        use super::*;

        #[test]
        fn valid_form() {
            let form = NewTicket::new("Printer jammed", "Third floor", "alice")
                .with_priority(Priority::High)
                .with_tag("hardware");
            assert!(form.validate().is_ok());
            assert!(form.tags.contains("hardware"));
        }

        #[test]
        fn empty_subject_fails() {
            let form = NewTicket::new("   ", "", "alice");
            match form.validate() {
                Err(DeskError::InvalidTicket(reason)) => assert!(reason.contains("subject")),
                other => panic!("expected InvalidTicket, got {other:?}"),
            }
        }

        #[test]
        fn long_subject_fails() {
            let form = NewTicket::new("x".repeat(MAX_SUBJECT_LENGTH + 1), "", "alice");
            assert!(form.validate().is_err());
        }

        #[test]
        fn empty_requester_fails() {
            let form = NewTicket::new("VPN down", "", "");
            match form.validate() {
                Err(DeskError::InvalidTicket(reason)) => assert!(reason.contains("requester")),
                other => panic!("expected InvalidTicket, got {other:?}"),
            }
        }
    }
}
