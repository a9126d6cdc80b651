//! Declarative rule actions.
//!
//! Actions are tagged by `type`:
//!
//! ```json
//! [ { "type": "set_priority", "priority": "urgent" },
//!   { "type": "assign", "agent": "netops" },
//!   { "type": "notify", "recipients": ["assignee"], "message": "New outage ticket" } ]
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use desk_audit::FieldChange;
use desk_core::{Comment, Priority, SlaPolicySet, Ticket, TicketStatus};
use desk_notify::{Notification, NotificationKind};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};

/// Author recorded on comments added by rules.
pub const AUTOMATION_AUTHOR: &str = "automation";

const fn default_true() -> bool {
    true
}

/// Who a `notify` action addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recipient {
    /// The current assignee.
    Assignee,
    /// The requester.
    Requester,
    /// A literal user name or e-mail address.
    User(String),
}

impl Recipient {
    /// Resolves the recipient against a ticket.
    #[must_use]
    pub fn resolve(&self, ticket: &Ticket) -> Option<String> {
        match self {
            Self::Assignee => ticket.assignee.clone(),
            Self::Requester => Some(ticket.requester.clone()),
            Self::User(user) => Some(user.clone()),
        }
        .filter(|r| !r.trim().is_empty())
    }
}

impl From<String> for Recipient {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "assignee" => Self::Assignee,
            "requester" => Self::Requester,
            _ => Self::User(trimmed.to_string()),
        }
    }
}

impl From<Recipient> for String {
    fn from(recipient: Recipient) -> Self {
        recipient.to_string()
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assignee => f.write_str("assignee"),
            Self::Requester => f.write_str("requester"),
            Self::User(user) => f.write_str(user),
        }
    }
}

/// A change a rule makes to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Set the priority (re-stamps SLA due dates).
    SetPriority {
        /// New priority.
        priority: Priority,
    },
    /// Move the ticket to another status.
    SetStatus {
        /// New status.
        status: TicketStatus,
    },
    /// Assign to an agent.
    Assign {
        /// Agent user name.
        agent: String,
    },
    /// Clear the assignee.
    Unassign,
    /// File under a category.
    SetCategory {
        /// Category name.
        category: String,
    },
    /// Add a tag.
    AddTag {
        /// Tag to add.
        tag: String,
    },
    /// Remove a tag (case-insensitive).
    RemoveTag {
        /// Tag to remove.
        tag: String,
    },
    /// Set a custom field.
    SetField {
        /// Field name without the `custom.` prefix.
        name: String,
        /// New value.
        value: String,
    },
    /// Add a comment authored by `automation`.
    AddComment {
        /// Comment text.
        body: String,
        /// Internal note (default) or public reply.
        #[serde(default = "default_true")]
        internal: bool,
    },
    /// Send a notification.
    Notify {
        /// Who to notify.
        recipients: Vec<Recipient>,
        /// Message text.
        message: String,
    },
    /// Escalate the ticket one level.
    Escalate {
        /// Reassign to this agent.
        #[serde(default)]
        assign_to: Option<String>,
        /// Raise the priority one step.
        #[serde(default = "default_true")]
        raise_priority: bool,
    },
}

/// What applying one action did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Fields that changed.
    pub changes: Vec<FieldChange>,
    /// Notifications to dispatch.
    pub notifications: Vec<Notification>,
}

impl ActionOutcome {
    fn change(&mut self, field: &str, old: Option<String>, new: Option<String>) {
        self.changes.push(FieldChange::new(field, old, new));
    }
}

/// Inputs an action needs besides the ticket.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Evaluation time.
    pub now: DateTime<Utc>,
    /// SLA targets used when the priority changes.
    pub sla: &'a SlaPolicySet,
    /// Rule name recorded on notifications.
    pub source: &'a str,
    /// Kind of notification raised by `notify`.
    pub kind: NotificationKind,
}

impl Action {
    /// Returns the action type name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SetPriority { .. } => "set_priority",
            Self::SetStatus { .. } => "set_status",
            Self::Assign { .. } => "assign",
            Self::Unassign => "unassign",
            Self::SetCategory { .. } => "set_category",
            Self::AddTag { .. } => "add_tag",
            Self::RemoveTag { .. } => "remove_tag",
            Self::SetField { .. } => "set_field",
            Self::AddComment { .. } => "add_comment",
            Self::Notify { .. } => "notify",
            Self::Escalate { .. } => "escalate",
        }
    }

    fn invalid(&self, reason: &str) -> RuleError {
        RuleError::InvalidAction {
            action: self.kind().to_string(),
            reason: reason.to_string(),
        }
    }

    fn failed(&self, reason: impl Into<String>) -> RuleError {
        RuleError::ActionFailed {
            action: self.kind().to_string(),
            reason: reason.into(),
        }
    }

    /// Checks the action's arguments.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidAction` if a required argument is blank or
    /// the action would send a ticket for approval.
    pub fn validate(&self) -> Result<()> {
        fn blank(s: &str) -> bool {
            s.trim().is_empty()
        }

        match self {
            Self::SetStatus {
                status: TicketStatus::PendingApproval,
            } => Err(self.invalid("pending_approval is only entered through an approval request")),
            Self::Assign { agent } if blank(agent) => Err(self.invalid("agent cannot be empty")),
            Self::SetCategory { category } if blank(category) => {
                Err(self.invalid("category cannot be empty"))
            }
            Self::AddTag { tag } | Self::RemoveTag { tag } if blank(tag) => {
                Err(self.invalid("tag cannot be empty"))
            }
            Self::SetField { name, .. } if blank(name) => {
                Err(self.invalid("field name cannot be empty"))
            }
            Self::AddComment { body, .. } if blank(body) => {
                Err(self.invalid("comment cannot be empty"))
            }
            Self::Notify { recipients, .. } if recipients.is_empty() => {
                Err(self.invalid("at least one recipient is required"))
            }
            Self::Notify { message, .. } if blank(message) => {
                Err(self.invalid("message cannot be empty"))
            }
            Self::Escalate {
                assign_to: Some(agent),
                ..
            } if blank(agent) => Err(self.invalid("assign_to cannot be empty")),
            _ => Ok(()),
        }
    }

    /// Applies the action to a ticket.
    ///
    /// Returns the changes made (none when the ticket already had the value)
    /// and the notifications requested.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::ActionFailed` if the lifecycle forbids a status
    /// change, the ticket is waiting for an approval decision, or a
    /// notification has nobody to go to.
    pub fn apply(&self, ticket: &mut Ticket, ctx: &ActionContext<'_>) -> Result<ActionOutcome> {
        let mut outcome = ActionOutcome::default();

        match self {
            Self::SetPriority { priority } => {
                set_priority(ticket, *priority, ctx.sla, &mut outcome);
            }
            Self::SetStatus { status } => {
                let old = ticket.status;
                if old == TicketStatus::PendingApproval && *status != old {
                    return Err(self.failed(format!(
                        "{} is waiting for an approval decision",
                        ticket.id
                    )));
                }
                let changed = ticket
                    .transition(*status, ctx.now)
                    .map_err(|e| self.failed(e.to_string()))?;
                if changed {
                    outcome.change(
                        "status",
                        Some(old.to_string()),
                        Some(status.to_string()),
                    );
                }
            }
            Self::Assign { agent } => {
                let agent = agent.trim();
                if ticket.assignee.as_deref() != Some(agent) {
                    let old = ticket.assignee.replace(agent.to_string());
                    outcome.change("assignee", old, Some(agent.to_string()));
                }
            }
            Self::Unassign => {
                if let Some(old) = ticket.assignee.take() {
                    outcome.change("assignee", Some(old), None);
                }
            }
            Self::SetCategory { category } => {
                let category = category.trim();
                let same = ticket
                    .category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category));
                if !same {
                    let old = ticket.category.replace(category.to_string());
                    outcome.change("category", old, Some(category.to_string()));
                }
            }
            Self::AddTag { tag } => {
                let tag = tag.trim();
                if !ticket.has_tag(tag) {
                    ticket.tags.insert(tag.to_string());
                    outcome.change("tags", None, Some(tag.to_string()));
                }
            }
            Self::RemoveTag { tag } => {
                let existing = ticket
                    .tags
                    .iter()
                    .find(|t| t.eq_ignore_ascii_case(tag.trim()))
                    .cloned();
                if let Some(existing) = existing {
                    ticket.tags.remove(&existing);
                    outcome.change("tags", Some(existing), None);
                }
            }
            Self::SetField { name, value } => {
                let name = name.trim();
                if ticket.custom_fields.get(name) != Some(value) {
                    let old = ticket.custom_fields.insert(name.to_string(), value.clone());
                    outcome.change(&format!("custom.{name}"), old, Some(value.clone()));
                }
            }
            Self::AddComment { body, internal } => {
                let comment = if *internal {
                    Comment::internal(AUTOMATION_AUTHOR, body.clone(), ctx.now)
                } else {
                    Comment::public(AUTOMATION_AUTHOR, body.clone(), ctx.now)
                };
                ticket.add_comment(comment);
                outcome.change("comments", None, Some(body.clone()));
            }
            Self::Notify {
                recipients,
                message,
            } => {
                let resolved: Vec<String> =
                    recipients.iter().filter_map(|r| r.resolve(ticket)).collect();
                if resolved.is_empty() {
                    return Err(self.failed("no resolvable recipient"));
                }
                outcome.notifications.push(
                    Notification::for_ticket(ticket, ctx.kind, message.clone())
                        .with_recipients(resolved)
                        .with_source(ctx.source),
                );
            }
            Self::Escalate {
                assign_to,
                raise_priority,
            } => {
                let old = ticket.escalation_level;
                ticket.escalation_level = old.saturating_add(1);
                outcome.change(
                    "escalation_level",
                    Some(old.to_string()),
                    Some(ticket.escalation_level.to_string()),
                );

                if let Some(agent) = assign_to {
                    let agent = agent.trim();
                    if ticket.assignee.as_deref() != Some(agent) {
                        let old = ticket.assignee.replace(agent.to_string());
                        outcome.change("assignee", old, Some(agent.to_string()));
                    }
                }

                if *raise_priority {
                    let raised = ticket.priority.raised();
                    set_priority(ticket, raised, ctx.sla, &mut outcome);
                }
            }
        }

        Ok(outcome)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetPriority { priority } => write!(f, "set priority to {priority}"),
            Self::SetStatus { status } => write!(f, "set status to {status}"),
            Self::Assign { agent } => write!(f, "assign to {agent}"),
            Self::Unassign => f.write_str("unassign"),
            Self::SetCategory { category } => write!(f, "set category to {category}"),
            Self::AddTag { tag } => write!(f, "add tag {tag}"),
            Self::RemoveTag { tag } => write!(f, "remove tag {tag}"),
            Self::SetField { name, value } => write!(f, "set custom.{name} to {value}"),
            Self::AddComment { internal, .. } => {
                f.write_str(if *internal { "add internal note" } else { "add public reply" })
            }
            Self::Notify { recipients, .. } => {
                let names: Vec<String> = recipients.iter().map(ToString::to_string).collect();
                write!(f, "notify {}", names.join(", "))
            }
            Self::Escalate { assign_to, .. } => match assign_to {
                Some(agent) => write!(f, "escalate to {agent}"),
                None => f.write_str("escalate"),
            },
        }
    }
}

fn set_priority(
    ticket: &mut Ticket,
    priority: Priority,
    sla: &SlaPolicySet,
    outcome: &mut ActionOutcome,
) {
    if ticket.priority != priority {
        outcome.change(
            "priority",
            Some(ticket.priority.to_string()),
            Some(priority.to_string()),
        );
        ticket.priority = priority;
        sla.apply(ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use desk_core::{NewTicket, TicketStore};
    use serde_json::json;
    use test_case::test_case;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 6, 12, 0, 0).unwrap()
    }

    fn ticket() -> Ticket {
        TicketStore::default()
            .create(
                NewTicket::new("Payroll export fails", "Error 500", "alice")
                    .with_category("Finance Apps")
                    .with_tag("payroll"),
                now() - Duration::hours(2),
            )
            .unwrap()
    }

    fn apply(action: &Action, ticket: &mut Ticket) -> Result<ActionOutcome> {
        let sla = SlaPolicySet::default();
        let ctx = ActionContext {
            now: now(),
            sla: &sla,
            source: "Route payroll",
            kind: NotificationKind::RuleAction,
        };
        action.apply(ticket, &ctx)
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn deserialize_tagged_actions() {
            let actions: Vec<Action> = serde_json::from_value(json!([
                { "type": "set_priority", "priority": "urgent" },
                { "type": "unassign" },
                { "type": "add_comment", "body": "Routed by rule" },
                { "type": "notify", "recipients": ["Assignee", "ops@example.com"], "message": "hi" },
                { "type": "escalate" }
            ]))
            .unwrap();

            assert_eq!(actions[0], Action::SetPriority { priority: Priority::Urgent });
            assert_eq!(actions[1], Action::Unassign);
            assert!(matches!(actions[2], Action::AddComment { internal: true, .. }));
            assert_eq!(
                actions[3],
                Action::Notify {
                    recipients: vec![Recipient::Assignee, Recipient::User("ops@example.com".into())],
                    message: "hi".to_string(),
                }
            );
            assert_eq!(
                actions[4],
                Action::Escalate { assign_to: None, raise_priority: true }
            );
        }

        #[test]
        fn unknown_type_rejected() {
            let result = serde_json::from_value::<Action>(json!({ "type": "delete_ticket" }));
            assert!(result.is_err());
        }

        #[test]
        fn recipient_serializes_as_string() {
            let json = serde_json::to_value(vec![Recipient::Requester, Recipient::User("dave".into())])
                .unwrap();
            assert_eq!(json, json!(["requester", "dave"]));
        }
    }

    mod validation_tests {
        use super::*;
        use test_case::test_case;

        #[test_case(Action::Assign { agent: " ".into() }; "blank agent")]
        #[test_case(Action::AddTag { tag: String::new() }; "blank tag")]
        #[test_case(Action::SetField { name: String::new(), value: "x".into() }; "blank field")]
        #[test_case(Action::AddComment { body: String::new(), internal: true }; "blank comment")]
        #[test_case(Action::Notify { recipients: vec![], message: "x".into() }; "no recipients")]
        #[test_case(Action::Escalate { assign_to: Some(String::new()), raise_priority: false }; "blank escalation agent")]
        #[test_case(Action::SetStatus { status: TicketStatus::PendingApproval }; "approval status")]
        fn invalid(action: Action) {
            assert!(matches!(action.validate(), Err(RuleError::InvalidAction { .. })));
        }

        #[test]
        fn valid() {
            assert!(Action::Unassign.validate().is_ok());
            assert!(Action::Escalate { assign_to: None, raise_priority: true }.validate().is_ok());
        }
    }

    mod apply_tests {
        use super::*;

        #[test]
        fn set_priority_restamps_sla() {
            let mut t = ticket();
            let outcome = apply(&Action::SetPriority { priority: Priority::Urgent }, &mut t).unwrap();

            assert_eq!(t.priority, Priority::Urgent);
            assert_eq!(t.resolution_due_at, Some(t.created_at + Duration::minutes(240)));
            assert_eq!(outcome.changes[0].to_string(), "priority: medium -> urgent");

            let again = apply(&Action::SetPriority { priority: Priority::Urgent }, &mut t).unwrap();
            assert!(again.changes.is_empty());
        }

        #[test]
        fn set_status_respects_lifecycle() {
            let mut t = ticket();
            apply(&Action::SetStatus { status: TicketStatus::Resolved }, &mut t).unwrap();
            assert_eq!(t.resolved_at, Some(now()));

            let err = apply(&Action::SetStatus { status: TicketStatus::Rejected }, &mut t).unwrap_err();
            assert!(matches!(err, RuleError::ActionFailed { .. }));
            assert_eq!(t.status, TicketStatus::Resolved);
        }

        #[test]
        fn set_status_leaves_pending_approval_alone() {
            let mut t = ticket();
            t.transition(TicketStatus::PendingApproval, now()).unwrap();

            let err = apply(&Action::SetStatus { status: TicketStatus::Closed }, &mut t).unwrap_err();
            assert!(matches!(err, RuleError::ActionFailed { .. }));
            assert_eq!(t.status, TicketStatus::PendingApproval);
            assert!(t.resolved_at.is_none());
        }

        #[test]
        fn assign_and_unassign() {
            let mut t = ticket();
            let outcome = apply(&Action::Assign { agent: "dave".into() }, &mut t).unwrap();
            assert_eq!(t.assignee.as_deref(), Some("dave"));
            assert_eq!(outcome.changes.len(), 1);
            assert!(apply(&Action::Assign { agent: "dave".into() }, &mut t).unwrap().changes.is_empty());

            apply(&Action::Unassign, &mut t).unwrap();
            assert!(t.assignee.is_none());
            assert!(apply(&Action::Unassign, &mut t).unwrap().changes.is_empty());
        }

        #[test]
        fn category_compares_case_insensitively() {
            let mut t = ticket();
            let same = apply(&Action::SetCategory { category: "finance apps".into() }, &mut t).unwrap();
            assert!(same.changes.is_empty());

            apply(&Action::SetCategory { category: "Payroll".into() }, &mut t).unwrap();
            assert_eq!(t.category.as_deref(), Some("Payroll"));
        }

        #[test]
        fn tags() {
            let mut t = ticket();
            assert!(apply(&Action::AddTag { tag: "PAYROLL".into() }, &mut t).unwrap().changes.is_empty());
            apply(&Action::AddTag { tag: "vip".into() }, &mut t).unwrap();
            assert!(t.has_tag("vip"));

            let outcome = apply(&Action::RemoveTag { tag: "Payroll".into() }, &mut t).unwrap();
            assert_eq!(outcome.changes[0].old.as_deref(), Some("payroll"));
            assert!(!t.has_tag("payroll"));
        }

        #[test]
        fn set_field() {
            let mut t = ticket();
            let outcome = apply(
                &Action::SetField { name: "cost_centre".into(), value: "CC-12".into() },
                &mut t,
            )
            .unwrap();
            assert_eq!(outcome.changes[0].field, "custom.cost_centre");
            assert_eq!(t.custom_fields.get("cost_centre").map(String::as_str), Some("CC-12"));
        }

        #[test]
        fn add_comment_is_internal_by_default() {
            let mut t = ticket();
            apply(&Action::AddComment { body: "Auto-routed".into(), internal: true }, &mut t).unwrap();
            assert_eq!(t.comments[0].author, AUTOMATION_AUTHOR);
            assert!(t.comments[0].internal);
            assert!(t.first_response_at.is_none());
        }

        #[test]
        fn notify_resolves_recipients() {
            let mut t = ticket();
            t.assignee = Some("dave".to_string());
            let action = Action::Notify {
                recipients: vec![Recipient::Assignee, Recipient::Requester],
                message: "Heads up".into(),
            };
            let outcome = apply(&action, &mut t).unwrap();

            let n = &outcome.notifications[0];
            assert_eq!(n.recipients, vec!["dave", "alice"]);
            assert_eq!(n.source, "Route payroll");
            assert_eq!(n.kind, NotificationKind::RuleAction);
            assert!(outcome.changes.is_empty());
        }

        #[test]
        fn notify_without_recipient_fails() {
            let mut t = ticket();
            let action = Action::Notify {
                recipients: vec![Recipient::Assignee],
                message: "Heads up".into(),
            };
            let err = apply(&action, &mut t).unwrap_err();
            assert_eq!(err.to_string(), "notify failed: no resolvable recipient");
        }

        #[test]
        fn escalate_bumps_level_reassigns_and_raises() {
            let mut t = ticket();
            let action = Action::Escalate {
                assign_to: Some("team-lead".into()),
                raise_priority: true,
            };
            let outcome = apply(&action, &mut t).unwrap();

            assert_eq!(t.escalation_level, 1);
            assert_eq!(t.assignee.as_deref(), Some("team-lead"));
            assert_eq!(t.priority, Priority::High);
            let fields: Vec<&str> = outcome.changes.iter().map(|c| c.field.as_str()).collect();
            assert_eq!(fields, vec!["escalation_level", "assignee", "priority"]);
        }

        #[test]
        fn escalate_at_urgent_keeps_priority() {
            let mut t = ticket();
            t.priority = Priority::Urgent;
            let outcome = apply(
                &Action::Escalate { assign_to: None, raise_priority: true },
                &mut t,
            )
            .unwrap();
            assert_eq!(outcome.changes.len(), 1);
        }
    }

    #[test]
    fn display() {
        assert_eq!(Action::Assign { agent: "dave".into() }.to_string(), "assign to dave");
        assert_eq!(
            Action::Notify {
                recipients: vec![Recipient::Assignee, Recipient::User("ops".into())],
                message: String::new(),
            }
            .to_string(),
            "notify assignee, ops"
        );
    }
}
