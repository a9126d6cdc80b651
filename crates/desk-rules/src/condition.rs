//! Declarative ticket conditions.
//!
//! A [`ConditionSet`] is the `conditions` document of a rule:
//!
//! ```json
//! { "match": "all", "conditions": [
//!     { "field": "priority", "operator": "greater_than_or_equal", "value": "high" },
//!     { "field": "subject", "operator": "contains", "value": "outage" } ] }
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use desk_core::{Priority, Ticket, TicketStatus};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RuleError};

/// Upper bound for compiled pattern size.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// A ticket attribute a condition reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Field {
    /// Ticket subject.
    Subject,
    /// Ticket description.
    Description,
    /// Priority, ordered by rank.
    Priority,
    /// Lifecycle status.
    Status,
    /// Category name.
    Category,
    /// Assigned agent.
    Assignee,
    /// Requesting user.
    Requester,
    /// Requester department.
    Department,
    /// Tag set.
    Tags,
    /// Number of escalations so far.
    EscalationLevel,
    /// Hours since the ticket was raised.
    HoursSinceCreated,
    /// Hours since the last update.
    HoursSinceUpdated,
    /// A custom field (`custom.<name>`).
    Custom(String),
}

impl Field {
    /// Prefix of custom field names.
    pub const CUSTOM_PREFIX: &'static str = "custom.";

    /// Returns true for fields holding numbers.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::EscalationLevel | Self::HoursSinceCreated | Self::HoursSinceUpdated
        )
    }

    fn read(&self, ticket: &Ticket, now: DateTime<Utc>) -> Actual {
        match self {
            Self::Subject => Actual::text(Some(ticket.subject.as_str())),
            Self::Description => Actual::text(Some(ticket.description.as_str())),
            Self::Priority => Actual::Priority(ticket.priority),
            Self::Status => Actual::Status(ticket.status),
            Self::Category => Actual::text(ticket.category.as_deref()),
            Self::Assignee => Actual::text(ticket.assignee.as_deref()),
            Self::Requester => Actual::text(Some(ticket.requester.as_str())),
            Self::Department => Actual::text(ticket.department.as_deref()),
            Self::Tags => Actual::Tags(ticket.tags.iter().cloned().collect()),
            Self::EscalationLevel => Actual::Number(f64::from(ticket.escalation_level)),
            Self::HoursSinceCreated => {
                Actual::Number(ticket.minutes_since_created(now) as f64 / 60.0)
            }
            Self::HoursSinceUpdated => {
                Actual::Number(ticket.minutes_since_updated(now) as f64 / 60.0)
            }
            Self::Custom(name) => Actual::text(
                ticket
                    .custom_fields
                    .get(name)
                    .or_else(|| {
                        ticket
                            .custom_fields
                            .iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case(name))
                            .map(|(_, v)| v)
                    })
                    .map(String::as_str),
            ),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subject => "subject",
            Self::Description => "description",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::Category => "category",
            Self::Assignee => "assignee",
            Self::Requester => "requester",
            Self::Department => "department",
            Self::Tags => "tags",
            Self::EscalationLevel => "escalation_level",
            Self::HoursSinceCreated => "hours_since_created",
            Self::HoursSinceUpdated => "hours_since_updated",
            Self::Custom(name) => return write!(f, "{}{name}", Self::CUSTOM_PREFIX),
        };
        f.write_str(name)
    }
}

impl FromStr for Field {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some(name) = trimmed.strip_prefix(Self::CUSTOM_PREFIX) {
            let name = name.trim();
            if name.is_empty() {
                return Err(RuleError::InvalidCondition {
                    field: trimmed.to_string(),
                    reason: "custom field name cannot be empty".to_string(),
                });
            }
            return Ok(Self::Custom(name.to_string()));
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "subject" => Ok(Self::Subject),
            "description" => Ok(Self::Description),
            "priority" => Ok(Self::Priority),
            "status" => Ok(Self::Status),
            "category" => Ok(Self::Category),
            "assignee" => Ok(Self::Assignee),
            "requester" => Ok(Self::Requester),
            "department" => Ok(Self::Department),
            "tags" => Ok(Self::Tags),
            "escalation_level" => Ok(Self::EscalationLevel),
            "hours_since_created" => Ok(Self::HoursSinceCreated),
            "hours_since_updated" => Ok(Self::HoursSinceUpdated),
            _ => Err(RuleError::InvalidCondition {
                field: trimmed.to_string(),
                reason: "unknown field".to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Field {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Field> for String {
    fn from(field: Field) -> Self {
        field.to_string()
    }
}

/// How a condition compares a field with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal (case-insensitive).
    Equals,
    /// Not equal.
    NotEquals,
    /// Substring.
    Contains,
    /// No substring.
    NotContains,
    /// Prefix.
    StartsWith,
    /// Suffix.
    EndsWith,
    /// One of a list.
    In,
    /// None of a list.
    NotIn,
    /// Greater than (>).
    GreaterThan,
    /// Greater than or equal (>=).
    GreaterThanOrEqual,
    /// Less than (<).
    LessThan,
    /// Less than or equal (<=).
    LessThanOrEqual,
    /// No value.
    IsEmpty,
    /// Any value.
    IsNotEmpty,
    /// Regular expression (case-insensitive).
    Matches,
}

impl Operator {
    /// Returns the operator name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
            Self::Matches => "matches",
        }
    }

    /// Returns true for the numeric ordering operators.
    #[must_use]
    pub const fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::GreaterThanOrEqual | Self::LessThan | Self::LessThanOrEqual
        )
    }

    /// Returns true for the operators that a missing value satisfies.
    #[must_use]
    pub const fn holds_for_missing(&self) -> bool {
        matches!(
            self,
            Self::IsEmpty | Self::NotEquals | Self::NotContains | Self::NotIn
        )
    }

    /// The positive form of a negated operator.
    const fn positive(self) -> Option<Self> {
        match self {
            Self::NotEquals => Some(Self::Equals),
            Self::NotContains => Some(Self::Contains),
            Self::NotIn => Some(Self::In),
            _ => None,
        }
    }

    fn compare(self, left: f64, right: f64) -> bool {
        match self {
            Self::GreaterThan => left > right,
            Self::GreaterThanOrEqual => left >= right,
            Self::LessThan => left < right,
            Self::LessThanOrEqual => left <= right,
            Self::Equals | Self::In => (left - right).abs() < f64::EPSILON,
            Self::NotEquals | Self::NotIn => (left - right).abs() >= f64::EPSILON,
            _ => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a field on one ticket.
#[derive(Debug)]
enum Actual {
    Missing,
    Text(String),
    Priority(Priority),
    Status(TicketStatus),
    Tags(Vec<String>),
    Number(f64),
}

impl Actual {
    fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Self::Text(v.to_string()),
            _ => Self::Missing,
        }
    }
}

/// One comparison against a ticket field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Field to read.
    pub field: Field,
    /// Comparison.
    pub operator: Operator,
    /// Value to compare with (ignored by `is_empty`/`is_not_empty`).
    ///
    /// A `matches` pattern is compiled once; build a new condition to change it.
    #[serde(default)]
    pub value: Value,
    #[serde(skip)]
    pattern: CompiledPattern,
}

/// Regex of a `matches` condition, compiled on first use.
#[derive(Default)]
struct CompiledPattern(OnceLock<Option<Regex>>);

impl CompiledPattern {
    fn get(&self, value: &Value) -> Option<&Regex> {
        self.0
            .get_or_init(|| value.as_str().and_then(|p| compile(p).ok()))
            .as_ref()
    }
}

impl Clone for CompiledPattern {
    fn clone(&self) -> Self {
        let cell = OnceLock::new();
        if let Some(compiled) = self.0.get() {
            let _ = cell.set(compiled.clone());
        }
        Self(cell)
    }
}

// The cache follows `value`, so it never decides equality.
impl PartialEq for CompiledPattern {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.get().is_some() { "compiled" } else { "pending" })
    }
}

impl Condition {
    /// Creates and validates a condition.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidCondition` if the value does not fit the
    /// field and operator.
    pub fn new(field: Field, operator: Operator, value: impl Into<Value>) -> Result<Self> {
        let condition = Self {
            field,
            operator,
            value: value.into(),
            pattern: CompiledPattern::default(),
        };
        condition.validate()?;
        Ok(condition)
    }

    fn invalid(&self, reason: impl Into<String>) -> RuleError {
        RuleError::InvalidCondition {
            field: self.field.to_string(),
            reason: reason.into(),
        }
    }

    /// Checks that the value fits the field and operator.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidCondition` describing the mismatch.
    pub fn validate(&self) -> Result<()> {
        let op = self.operator;
        match op {
            Operator::IsEmpty | Operator::IsNotEmpty => Ok(()),
            Operator::In | Operator::NotIn => {
                let Value::Array(items) = &self.value else {
                    return Err(self.invalid(format!("{op} expects a list of values")));
                };
                items.iter().try_for_each(|item| self.validate_scalar(item))
            }
            Operator::Matches => {
                if self.field.is_numeric() {
                    return Err(self.invalid(format!("{op} is not supported on numbers")));
                }
                let Some(pattern) = self.value.as_str() else {
                    return Err(self.invalid("matches expects a pattern string"));
                };
                let compiled =
                    compile(pattern).map_err(|e| self.invalid(format!("invalid pattern: {e}")))?;
                let _ = self.pattern.0.set(Some(compiled));
                Ok(())
            }
            _ if op.is_ordering() => match self.field {
                Field::Priority => priority_rank(&self.value)
                    .map(|_| ())
                    .ok_or_else(|| self.invalid(format!("{op} expects a priority or a number"))),
                Field::Status | Field::Tags => {
                    Err(self.invalid(format!("{op} is not supported on this field")))
                }
                _ => as_number(&self.value)
                    .map(|_| ())
                    .ok_or_else(|| self.invalid(format!("{op} expects a number"))),
            },
            Operator::Contains
            | Operator::NotContains
            | Operator::StartsWith
            | Operator::EndsWith
                if self.field.is_numeric() =>
            {
                Err(self.invalid(format!("{op} is not supported on numbers")))
            }
            Operator::Equals | Operator::NotEquals => self.validate_scalar(&self.value),
            _ => scalar_text(&self.value)
                .map(|_| ())
                .ok_or_else(|| self.invalid(format!("{op} expects a string"))),
        }
    }

    /// Validates one value compared for equality.
    fn validate_scalar(&self, value: &Value) -> Result<()> {
        let Some(text) = scalar_text(value) else {
            return Err(self.invalid("expected a string or number"));
        };
        match self.field {
            Field::Priority => Priority::from_str(&text)
                .map(|_| ())
                .map_err(|_| self.invalid(format!("unknown priority '{text}'"))),
            Field::Status => TicketStatus::from_str(&text)
                .map(|_| ())
                .map_err(|_| self.invalid(format!("unknown status '{text}'"))),
            _ if self.field.is_numeric() => as_number(value)
                .map(|_| ())
                .ok_or_else(|| self.invalid(format!("'{text}' is not a number"))),
            _ => Ok(()),
        }
    }

    /// Evaluates the condition against a ticket.
    #[must_use]
    pub fn evaluate(&self, ticket: &Ticket, now: DateTime<Utc>) -> bool {
        match self.field.read(ticket, now) {
            Actual::Missing => self.operator.holds_for_missing(),
            Actual::Text(text) => self.compare_text(self.operator, &text, canon_text),
            Actual::Priority(priority) => {
                if self.operator.is_ordering() {
                    priority_rank(&self.value)
                        .is_some_and(|rank| self.operator.compare(f64::from(priority.rank()), rank))
                } else {
                    self.compare_text(self.operator, priority.as_str(), canon_priority)
                }
            }
            Actual::Status(status) => {
                self.compare_text(self.operator, status.as_str(), canon_status)
            }
            Actual::Tags(tags) => self.compare_tags(&tags),
            Actual::Number(number) => self.compare_number(number),
        }
    }

    fn compare_text(&self, op: Operator, actual: &str, canon: fn(&str) -> String) -> bool {
        let expected = || scalar_text(&self.value);
        match op {
            Operator::Equals => expected().is_some_and(|e| canon(actual) == canon(&e)),
            Operator::NotEquals => !expected().is_some_and(|e| canon(actual) == canon(&e)),
            Operator::Contains => expected()
                .is_some_and(|e| actual.to_lowercase().contains(&e.to_lowercase())),
            Operator::NotContains => !expected()
                .is_some_and(|e| actual.to_lowercase().contains(&e.to_lowercase())),
            Operator::StartsWith => expected()
                .is_some_and(|e| actual.to_lowercase().starts_with(&e.to_lowercase())),
            Operator::EndsWith => expected()
                .is_some_and(|e| actual.to_lowercase().ends_with(&e.to_lowercase())),
            Operator::In => self.list().iter().any(|e| canon(actual) == canon(e)),
            Operator::NotIn => !self.list().iter().any(|e| canon(actual) == canon(e)),
            Operator::IsEmpty => false,
            Operator::IsNotEmpty => true,
            Operator::Matches => self
                .pattern
                .get(&self.value)
                .is_some_and(|re| re.is_match(actual)),
            Operator::GreaterThan
            | Operator::GreaterThanOrEqual
            | Operator::LessThan
            | Operator::LessThanOrEqual => match (actual.trim().parse::<f64>(), as_number(&self.value)) {
                (Ok(left), Some(right)) => op.compare(left, right),
                _ => false,
            },
        }
    }

    fn compare_tags(&self, tags: &[String]) -> bool {
        let op = self.operator;
        match op {
            Operator::IsEmpty => tags.is_empty(),
            Operator::IsNotEmpty => !tags.is_empty(),
            _ if op.is_ordering() => false,
            _ => match op.positive() {
                Some(positive) => !tags
                    .iter()
                    .any(|tag| self.compare_text(positive, tag, canon_text)),
                None => tags.iter().any(|tag| self.compare_text(op, tag, canon_text)),
            },
        }
    }

    fn compare_number(&self, actual: f64) -> bool {
        let op = self.operator;
        match op {
            Operator::IsEmpty => false,
            Operator::IsNotEmpty => true,
            Operator::In => self
                .list_numbers()
                .iter()
                .any(|e| Operator::Equals.compare(actual, *e)),
            Operator::NotIn => !self
                .list_numbers()
                .iter()
                .any(|e| Operator::Equals.compare(actual, *e)),
            Operator::Equals | Operator::NotEquals => {
                as_number(&self.value).is_some_and(|e| op.compare(actual, e))
            }
            _ if op.is_ordering() => as_number(&self.value).is_some_and(|e| op.compare(actual, e)),
            _ => false,
        }
    }

    fn list(&self) -> Vec<String> {
        match &self.value {
            Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
            _ => Vec::new(),
        }
    }

    fn list_numbers(&self) -> Vec<f64> {
        match &self.value {
            Value::Array(items) => items.iter().filter_map(as_number).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Operator::IsEmpty | Operator::IsNotEmpty => write!(f, "{} {}", self.field, self.operator),
            _ => write!(f, "{} {} {}", self.field, self.operator, self.value),
        }
    }
}

/// Whether every condition or any one must hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Every condition.
    #[default]
    All,
    /// At least one condition.
    Any,
}

/// The condition document of a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionSet {
    /// Combination mode.
    #[serde(rename = "match", default)]
    pub mode: MatchMode,
    /// The conditions.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Outcome of one condition in a dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionResult {
    /// Rendered condition.
    pub condition: String,
    /// Whether it held.
    pub matched: bool,
}

impl ConditionSet {
    /// Creates an empty set that requires every condition.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates an empty set that requires any condition.
    #[must_use]
    pub fn any() -> Self {
        Self {
            mode: MatchMode::Any,
            conditions: Vec::new(),
        }
    }

    /// Adds a condition.
    #[must_use]
    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Returns true if there are no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Validates every condition.
    ///
    /// # Errors
    ///
    /// Returns the first `RuleError::InvalidCondition` found.
    pub fn validate(&self) -> Result<()> {
        self.conditions.iter().try_for_each(Condition::validate)
    }

    /// Returns true if the ticket satisfies the set.
    ///
    /// An empty set matches every ticket.
    #[must_use]
    pub fn matches(&self, ticket: &Ticket, now: DateTime<Utc>) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        match self.mode {
            MatchMode::All => self.conditions.iter().all(|c| c.evaluate(ticket, now)),
            MatchMode::Any => self.conditions.iter().any(|c| c.evaluate(ticket, now)),
        }
    }

    /// Evaluates every condition separately.
    #[must_use]
    pub fn explain(&self, ticket: &Ticket, now: DateTime<Utc>) -> Vec<ConditionResult> {
        self.conditions
            .iter()
            .map(|c| ConditionResult {
                condition: c.to_string(),
                matched: c.evaluate(ticket, now),
            })
            .collect()
    }
}

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn priority_rank(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => Priority::from_str(s)
            .map(|p| f64::from(p.rank()))
            .ok()
            .or_else(|| s.trim().parse().ok()),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn canon_text(value: &str) -> String {
    value.trim().to_lowercase()
}

fn canon_priority(value: &str) -> String {
    Priority::from_str(value).map_or_else(|_| canon_text(value), |p| p.as_str().to_string())
}

fn canon_status(value: &str) -> String {
    TicketStatus::from_str(value).map_or_else(|_| canon_text(value), |s| s.as_str().to_string())
}
