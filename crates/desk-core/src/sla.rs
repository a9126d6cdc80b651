//! Service-level targets and the SLA clock.
//!
//! Each [`Priority`] carries a first-response and a resolution target. When a
//! ticket is created (or its priority changes) the targets are turned into due
//! dates on the ticket; [`SlaPolicySet::evaluate`] then reports where the
//! ticket stands against them.
//!
//! Clocks run on calendar time and keep running while a ticket is on hold.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ticket::{Priority, Ticket};

/// Default share of an SLA window after which a ticket counts as at risk.
pub const DEFAULT_AT_RISK_PERCENT: u8 = 75;

/// Targets for one priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaPolicy {
    /// Priority the targets apply to.
    pub priority: Priority,
    /// Minutes allowed until the first public response.
    pub first_response_minutes: u32,
    /// Minutes allowed until resolution.
    pub resolution_minutes: u32,
}

impl SlaPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(priority: Priority, first_response_minutes: u32, resolution_minutes: u32) -> Self {
        Self {
            priority,
            first_response_minutes,
            resolution_minutes,
        }
    }

    /// First-response deadline for a ticket raised at `created_at`.
    #[must_use]
    pub fn response_due(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::minutes(i64::from(self.first_response_minutes))
    }

    /// Resolution deadline for a ticket raised at `created_at`.
    #[must_use]
    pub fn resolution_due(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::minutes(i64::from(self.resolution_minutes))
    }
}

/// Where a ticket stands against one SLA target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaState {
    /// Running, comfortably inside the window.
    OnTrack,
    /// Running, most of the window used up.
    AtRisk,
    /// Running, past due.
    Breached,
    /// Milestone reached in time.
    Met,
    /// Milestone reached late.
    Missed,
}

impl SlaState {
    /// Returns the state as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::AtRisk => "at_risk",
            Self::Breached => "breached",
            Self::Met => "met",
            Self::Missed => "missed",
        }
    }

    /// Returns true for states that count against the desk.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Breached | Self::Missed)
    }
}

impl fmt::Display for SlaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// SLA standing of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaReport {
    /// First-response standing; `None` when no target applies.
    pub response: Option<SlaState>,
    /// Resolution standing; `None` when no target applies.
    pub resolution: Option<SlaState>,
}

/// The SLA targets of the desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaPolicySet {
    /// Share of a window (1-99) after which a running clock is at risk.
    pub at_risk_percent: u8,
    /// One policy per priority.
    pub policies: Vec<SlaPolicy>,
}

impl Default for SlaPolicySet {
    fn default() -> Self {
        Self {
            at_risk_percent: DEFAULT_AT_RISK_PERCENT,
            policies: vec![
                SlaPolicy::new(Priority::Urgent, 60, 240),
                SlaPolicy::new(Priority::High, 240, 1_440),
                SlaPolicy::new(Priority::Medium, 480, 4_320),
                SlaPolicy::new(Priority::Low, 1_440, 7_200),
            ],
        }
    }
}

impl SlaPolicySet {
    /// Creates a set with no targets.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            at_risk_percent: DEFAULT_AT_RISK_PERCENT,
            policies: Vec::new(),
        }
    }

    /// Adds or replaces the policy for its priority.
    #[must_use]
    pub fn with_policy(mut self, policy: SlaPolicy) -> Self {
        self.policies.retain(|p| p.priority != policy.priority);
        self.policies.push(policy);
        self
    }

    /// Sets the at-risk threshold.
    #[must_use]
    pub const fn with_at_risk_percent(mut self, percent: u8) -> Self {
        self.at_risk_percent = percent;
        self
    }

    /// Returns the policy for a priority.
    #[must_use]
    pub fn policy_for(&self, priority: Priority) -> Option<&SlaPolicy> {
        self.policies.iter().find(|p| p.priority == priority)
    }

    /// Stamps the due dates of a ticket from its priority and creation time.
    pub fn apply(&self, ticket: &mut Ticket) {
        match self.policy_for(ticket.priority) {
            Some(policy) => {
                ticket.response_due_at = Some(policy.response_due(ticket.created_at));
                ticket.resolution_due_at = Some(policy.resolution_due(ticket.created_at));
            }
            None => {
                ticket.response_due_at = None;
                ticket.resolution_due_at = None;
            }
        }
    }

    /// Reports the SLA standing of a ticket at `now`.
    #[must_use]
    pub fn evaluate(&self, ticket: &Ticket, now: DateTime<Utc>) -> SlaReport {
        let response = self.clock(
            ticket.created_at,
            ticket.response_due_at,
            ticket.first_response_at,
            now,
        );

        let resolution = if ticket.status.is_active() || ticket.resolved_at.is_some() {
            self.clock(
                ticket.created_at,
                ticket.resolution_due_at,
                ticket.resolved_at,
                now,
            )
        } else {
            None
        };

        SlaReport {
            response,
            resolution,
        }
    }

    fn clock(
        &self,
        started: DateTime<Utc>,
        due: Option<DateTime<Utc>>,
        reached: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<SlaState> {
        let due = due?;

        if let Some(reached) = reached {
            return Some(if reached <= due {
                SlaState::Met
            } else {
                SlaState::Missed
            });
        }

        if now > due {
            return Some(SlaState::Breached);
        }

        let window = due.signed_duration_since(started).num_seconds();
        let elapsed = now.signed_duration_since(started).num_seconds();
        if window > 0 && elapsed * 100 >= window * i64::from(self.at_risk_percent) {
            Some(SlaState::AtRisk)
        } else {
            Some(SlaState::OnTrack)
        }
    }
}
