//! Search filters for ticket index pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ticket::{Priority, Ticket, TicketStatus};

/// Criteria a ticket must meet to be listed.
///
/// Every populated field narrows the result; an empty filter matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    /// Allowed statuses.
    #[serde(default)]
    pub statuses: Vec<TicketStatus>,
    /// Allowed priorities.
    #[serde(default)]
    pub priorities: Vec<Priority>,
    /// Category name (case-insensitive).
    #[serde(default)]
    pub category: Option<String>,
    /// `Some(None)` selects unassigned tickets.
    #[serde(default)]
    pub assignee: Option<Option<String>>,
    /// Requester user name.
    #[serde(default)]
    pub requester: Option<String>,
    /// Department (case-insensitive).
    #[serde(default)]
    pub department: Option<String>,
    /// Tag the ticket must carry.
    #[serde(default)]
    pub tag: Option<String>,
    /// Free text searched in subject and description.
    #[serde(default)]
    pub text: Option<String>,
    /// Raised at or after this time.
    #[serde(default)]
    pub created_after: Option<DateTime<Utc>>,
    /// Raised before this time.
    #[serde(default)]
    pub created_before: Option<DateTime<Utc>>,
    /// Only active tickets past their resolution deadline.
    #[serde(default)]
    pub overdue_only: bool,
}

impl TicketFilter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one status (can be called repeatedly).
    #[must_use]
    pub fn status(mut self, status: TicketStatus) -> Self {
        self.statuses.push(status);
        self
    }

    /// Restricts to active statuses.
    #[must_use]
    pub fn active(mut self) -> Self {
        self.statuses
            .extend(TicketStatus::ALL.into_iter().filter(TicketStatus::is_active));
        self
    }

    /// Restricts to one priority (can be called repeatedly).
    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priorities.push(priority);
        self
    }

    /// Restricts to a category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restricts to tickets assigned to `agent`.
    #[must_use]
    pub fn assigned_to(mut self, agent: impl Into<String>) -> Self {
        self.assignee = Some(Some(agent.into()));
        self
    }

    /// Restricts to unassigned tickets.
    #[must_use]
    pub fn unassigned(mut self) -> Self {
        self.assignee = Some(None);
        self
    }

    /// Restricts to one requester.
    #[must_use]
    pub fn requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }

    /// Restricts to a department.
    #[must_use]
    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Restricts to a tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Searches subject and description.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Restricts to tickets raised inside `[after, before)`.
    #[must_use]
    pub const fn created_between(
        mut self,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_after = after;
        self.created_before = before;
        self
    }

    /// Restricts to overdue tickets.
    #[must_use]
    pub const fn overdue(mut self) -> Self {
        self.overdue_only = true;
        self
    }

    /// Returns true if the ticket passes every criterion.
    #[must_use]
    pub fn matches(&self, ticket: &Ticket, now: DateTime<Utc>) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&ticket.status) {
            return false;
        }

        if !self.priorities.is_empty() && !self.priorities.contains(&ticket.priority) {
            return false;
        }

        if let Some(category) = &self.category {
            if !eq_ci(ticket.category.as_deref(), category) {
                return false;
            }
        }

        if let Some(assignee) = &self.assignee {
            if ticket.assignee.as_deref() != assignee.as_deref() {
                return false;
            }
        }

        if let Some(requester) = &self.requester {
            if &ticket.requester != requester {
                return false;
            }
        }

        if let Some(department) = &self.department {
            if !eq_ci(ticket.department.as_deref(), department) {
                return false;
            }
        }

        if let Some(tag) = &self.tag {
            if !ticket.has_tag(tag) {
                return false;
            }
        }

        if let Some(text) = &self.text {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty()
                && !ticket.subject.to_lowercase().contains(&needle)
                && !ticket.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if self.created_after.is_some_and(|after| ticket.created_at < after) {
            return false;
        }

        if self
            .created_before
            .is_some_and(|before| ticket.created_at >= before)
        {
            return false;
        }

        if self.overdue_only && !ticket.is_overdue(now) {
            return false;
        }

        true
    }
}

fn eq_ci(value: Option<&str>, expected: &str) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(expected.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::TicketId;
    use chrono::{Duration, TimeZone};
    use std::collections::{BTreeMap, BTreeSet};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    fn ticket() -> Ticket {
        Ticket {
            id: TicketId::new(3),
            subject: "Laptop will not boot".to_string(),
            description: "Black screen after the BIOS logo".to_string(),
            requester: "bob".to_string(),
            department: Some("Finance".to_string()),
            category: Some("Hardware".to_string()),
            priority: Priority::High,
            status: TicketStatus::Open,
            assignee: None,
            tags: BTreeSet::from(["laptop".to_string()]),
            custom_fields: BTreeMap::new(),
            comments: Vec::new(),
            created_at: now() - Duration::hours(30),
            updated_at: now() - Duration::hours(30),
            first_response_at: None,
            resolved_at: None,
            response_due_at: None,
            resolution_due_at: Some(now() - Duration::hours(6)),
            escalation_level: 0,
            applied_escalations: Vec::new(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(TicketFilter::new().matches(&ticket(), now()));
    }

    #[test]
    fn status_and_priority() {
        let t = ticket();
        assert!(TicketFilter::new().active().matches(&t, now()));
        assert!(!TicketFilter::new()
            .status(TicketStatus::Closed)
            .matches(&t, now()));
        assert!(TicketFilter::new()
            .priority(Priority::Low)
            .priority(Priority::High)
            .matches(&t, now()));
        assert!(!TicketFilter::new()
            .priority(Priority::Urgent)
            .matches(&t, now()));
    }

    #[test]
    fn assignee_and_unassigned() {
        let mut t = ticket();
        assert!(TicketFilter::new().unassigned().matches(&t, now()));
        assert!(!TicketFilter::new().assigned_to("carol").matches(&t, now()));

        t.assignee = Some("carol".to_string());
        assert!(!TicketFilter::new().unassigned().matches(&t, now()));
        assert!(TicketFilter::new().assigned_to("carol").matches(&t, now()));
    }

    #[test]
    fn category_department_tag_are_case_insensitive() {
        let t = ticket();
        assert!(TicketFilter::new()
            .category("hardware")
            .department("FINANCE")
            .tag("Laptop")
            .matches(&t, now()));
        assert!(!TicketFilter::new().category("software").matches(&t, now()));
    }

    #[test]
    fn text_searches_subject_and_description() {
        let t = ticket();
        assert!(TicketFilter::new().text("BOOT").matches(&t, now()));
        assert!(TicketFilter::new().text("bios").matches(&t, now()));
        assert!(!TicketFilter::new().text("printer").matches(&t, now()));
        assert!(TicketFilter::new().text("   ").matches(&t, now()));
    }

    #[test]
    fn created_range() {
        let t = ticket();
        let filter = TicketFilter::new()
            .created_between(Some(now() - Duration::days(2)), Some(now()));
        assert!(filter.matches(&t, now()));

        let filter = TicketFilter::new().created_between(Some(now() - Duration::hours(1)), None);
        assert!(!filter.matches(&t, now()));
    }

    #[test]
    fn overdue_only() {
        let mut t = ticket();
        assert!(TicketFilter::new().overdue().matches(&t, now()));

        t.status = TicketStatus::Resolved;
        assert!(!TicketFilter::new().overdue().matches(&t, now()));
    }

    #[test]
    fn requester_must_match_exactly() {
        let t = ticket();
        assert!(TicketFilter::new().requester("bob").matches(&t, now()));
        assert!(!TicketFilter::new().requester("alice").matches(&t, now()));
    }
}
