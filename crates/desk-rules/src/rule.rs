//! Automation and escalation rule definitions.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use desk_core::Ticket;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actions::Action;
use crate::condition::ConditionSet;
use crate::error::{Result, RuleError};

/// Ticket event that runs automation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A ticket was raised.
    TicketCreated,
    /// Fields of a ticket were edited.
    TicketUpdated,
    /// A comment was added.
    CommentAdded,
    /// The status changed.
    StatusChanged,
}

impl Trigger {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TicketCreated => "ticket_created",
            Self::TicketUpdated => "ticket_updated",
            Self::CommentAdded => "comment_added",
            Self::StatusChanged => "status_changed",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which clock an escalation threshold runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationBasis {
    /// Age of the ticket.
    #[default]
    SinceCreated,
    /// Time since the last update.
    SinceUpdated,
    /// Time past the resolution deadline.
    PastResolutionDue,
}

impl EscalationBasis {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SinceCreated => "since_created",
            Self::SinceUpdated => "since_updated",
            Self::PastResolutionDue => "past_resolution_due",
        }
    }
}

/// When a rule runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Runs on ticket events.
    Automation {
        /// Events the rule listens to.
        triggers: Vec<Trigger>,
    },
    /// Runs on the periodic sweep once a ticket is old enough.
    Escalation {
        /// Threshold in minutes.
        after_minutes: u32,
        /// Clock the threshold is measured on.
        #[serde(default)]
        basis: EscalationBasis,
    },
}

impl RuleKind {
    /// Automation on the given triggers.
    #[must_use]
    pub fn automation(triggers: impl IntoIterator<Item = Trigger>) -> Self {
        Self::Automation {
            triggers: triggers.into_iter().collect(),
        }
    }

    /// Escalation after `after_minutes` on the given clock.
    #[must_use]
    pub const fn escalation(after_minutes: u32, basis: EscalationBasis) -> Self {
        Self::Escalation {
            after_minutes,
            basis,
        }
    }

    /// Returns `automation` or `escalation`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Automation { .. } => "automation",
            Self::Escalation { .. } => "escalation",
        }
    }

    /// Returns true for automation rules listening to `trigger`.
    #[must_use]
    pub fn listens_to(&self, trigger: Trigger) -> bool {
        matches!(self, Self::Automation { triggers } if triggers.contains(&trigger))
    }

    /// Returns true for escalation rules.
    #[must_use]
    pub const fn is_escalation(&self) -> bool {
        matches!(self, Self::Escalation { .. })
    }

    /// For escalation rules, whether the ticket is past the threshold.
    ///
    /// Always `None` for automation rules.
    #[must_use]
    pub fn threshold_reached(&self, ticket: &Ticket, now: DateTime<Utc>) -> Option<bool> {
        let Self::Escalation {
            after_minutes,
            basis,
        } = self
        else {
            return None;
        };

        let after = i64::from(*after_minutes);
        Some(match basis {
            EscalationBasis::SinceCreated => ticket.minutes_since_created(now) >= after,
            EscalationBasis::SinceUpdated => ticket.minutes_since_updated(now) >= after,
            EscalationBasis::PastResolutionDue => ticket
                .resolution_due_at
                .is_some_and(|due| now >= due + Duration::minutes(after)),
        })
    }
}

fn new_rule_id() -> String {
    Uuid::new_v4().to_string()
}

const fn default_enabled() -> bool {
    true
}

/// An automation or escalation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier for the rule.
    #[serde(default = "new_rule_id")]
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// What the rule is for.
    #[serde(default)]
    pub description: String,
    /// When the rule runs.
    pub kind: RuleKind,
    /// Conditions a ticket must meet.
    #[serde(default)]
    pub conditions: ConditionSet,
    /// Actions applied to matching tickets.
    pub actions: Vec<Action>,
    /// Position in the scan (lower runs first).
    #[serde(default)]
    pub order: i32,
    /// Whether the rule runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Stop scanning after this rule matches.
    #[serde(default)]
    pub stop_processing: bool,
}

impl Rule {
    /// Maximum allowed length for rule names.
    pub const MAX_NAME_LENGTH: usize = 256;

    /// Creates a new rule builder.
    pub fn builder(name: impl Into<String>, kind: RuleKind) -> RuleBuilder {
        RuleBuilder::new(name, kind)
    }

    /// Checks the whole definition.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidRule` if:
    /// - The name is empty or exceeds the maximum length
    /// - There are no actions
    /// - An automation rule has no triggers
    ///
    /// and the condition or action error for an invalid condition or action.
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if self.id.trim().is_empty() {
            return Err(RuleError::InvalidRule {
                reason: "rule ID cannot be empty".to_string(),
            });
        }

        if name.is_empty() {
            return Err(RuleError::InvalidRule {
                reason: "rule name cannot be empty".to_string(),
            });
        }

        if name.chars().count() > Self::MAX_NAME_LENGTH {
            return Err(RuleError::InvalidRule {
                reason: format!(
                    "rule name exceeds maximum length of {} characters",
                    Self::MAX_NAME_LENGTH
                ),
            });
        }

        if self.actions.is_empty() {
            return Err(RuleError::InvalidRule {
                reason: "rule needs at least one action".to_string(),
            });
        }

        if matches!(&self.kind, RuleKind::Automation { triggers } if triggers.is_empty()) {
            return Err(RuleError::InvalidRule {
                reason: "automation rule needs at least one trigger".to_string(),
            });
        }

        self.conditions.validate()?;
        self.actions.iter().try_for_each(Action::validate)
    }

    /// Scan order: by `order`, then by name.
    #[must_use]
    pub fn scan_order(&self, other: &Self) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Builder for creating [`Rule`] instances.
#[derive(Debug)]
pub struct RuleBuilder {
    id: Option<String>,
    name: String,
    description: String,
    kind: RuleKind,
    conditions: ConditionSet,
    actions: Vec<Action>,
    order: i32,
    enabled: bool,
    stop_processing: bool,
}

impl RuleBuilder {
    fn new(name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            kind,
            conditions: ConditionSet::default(),
            actions: Vec::new(),
            order: 0,
            enabled: true,
            stop_processing: false,
        }
    }

    /// Uses a fixed ID instead of a generated one.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the conditions.
    #[must_use]
    pub fn conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = conditions;
        self
    }

    /// Adds an action.
    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Sets the scan position.
    #[must_use]
    pub const fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Sets whether the rule is enabled.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Stops the scan after this rule matches.
    #[must_use]
    pub const fn stop_processing(mut self, stop: bool) -> Self {
        self.stop_processing = stop;
        self
    }

    /// Builds the [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns the first validation error of the definition.
    pub fn build(self) -> Result<Rule> {
        let rule = Rule {
            id: self.id.unwrap_or_else(new_rule_id),
            name: self.name.trim().to_string(),
            description: self.description,
            kind: self.kind,
            conditions: self.conditions,
            actions: self.actions,
            order: self.order,
            enabled: self.enabled,
            stop_processing: self.stop_processing,
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// Parses one rule or a list of rules from JSON and validates them.
///
/// # Errors
///
/// Returns `RuleError::Serialization` for malformed JSON and the validation
/// error of the first invalid rule.
pub fn parse_rules(json: &str) -> Result<Vec<Rule>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Rule>),
        One(Box<Rule>),
    }

    let rules = match serde_json::from_str::<OneOrMany>(json)? {
        OneOrMany::Many(rules) => rules,
        OneOrMany::One(rule) => vec![*rule],
    };
    rules.iter().try_for_each(Rule::validate)?;
    Ok(rules)
}
