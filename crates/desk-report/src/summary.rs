//! Dashboard figures.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use desk_core::{Priority, SlaPolicySet, SlaState, Ticket, TicketStatus, TicketStore};
use serde::{Deserialize, Serialize};

/// Category bucket for tickets without one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Figures for the desk dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// When the figures were computed.
    pub generated_at: DateTime<Utc>,
    /// Number of tickets.
    pub total: usize,
    /// Tickets still being worked.
    pub active: usize,
    /// Count per status (every status listed).
    pub by_status: BTreeMap<String, usize>,
    /// Count per priority (every priority listed).
    pub by_priority: BTreeMap<String, usize>,
    /// Count per category.
    pub by_category: BTreeMap<String, usize>,
    /// Active tickets per assignee.
    pub workload: BTreeMap<String, usize>,
    /// Active tickets without an assignee.
    pub unassigned: usize,
    /// Active tickets past their resolution due date.
    pub sla_breaches: usize,
    /// Active tickets close to their resolution due date.
    pub sla_at_risk: usize,
    /// Share of finished tickets resolved in time, in percent.
    pub resolution_compliance_percent: Option<f64>,
    /// Mean minutes to first response.
    pub mean_first_response_minutes: Option<f64>,
    /// Mean minutes to resolution.
    pub mean_resolution_minutes: Option<f64>,
}

impl DashboardSummary {
    /// Computes the figures for a set of tickets.
    #[must_use]
    pub fn compute(tickets: &[Ticket], sla: &SlaPolicySet, now: DateTime<Utc>) -> Self {
        let mut summary = Self {
            generated_at: now,
            total: tickets.len(),
            active: 0,
            by_status: TicketStatus::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), 0))
                .collect(),
            by_priority: Priority::ALL
                .iter()
                .map(|p| (p.as_str().to_string(), 0))
                .collect(),
            by_category: BTreeMap::new(),
            workload: BTreeMap::new(),
            unassigned: 0,
            sla_breaches: 0,
            sla_at_risk: 0,
            resolution_compliance_percent: None,
            mean_first_response_minutes: None,
            mean_resolution_minutes: None,
        };

        let (mut met, mut missed) = (0_usize, 0_usize);
        let mut response_minutes = Vec::new();
        let mut resolution_minutes = Vec::new();

        for ticket in tickets {
            *summary
                .by_status
                .entry(ticket.status.as_str().to_string())
                .or_default() += 1;
            *summary
                .by_priority
                .entry(ticket.priority.as_str().to_string())
                .or_default() += 1;
            *summary
                .by_category
                .entry(
                    ticket
                        .category
                        .clone()
                        .unwrap_or_else(|| UNCATEGORIZED.to_string()),
                )
                .or_default() += 1;

            let report = sla.evaluate(ticket, now);
            if ticket.status.is_active() {
                summary.active += 1;
                match &ticket.assignee {
                    Some(agent) => *summary.workload.entry(agent.clone()).or_default() += 1,
                    None => summary.unassigned += 1,
                }
                match report.resolution {
                    Some(SlaState::Breached) => summary.sla_breaches += 1,
                    Some(SlaState::AtRisk) => summary.sla_at_risk += 1,
                    _ => {}
                }
            }

            match report.resolution {
                Some(SlaState::Met) => met += 1,
                Some(SlaState::Missed) => missed += 1,
                _ => {}
            }

            if let Some(at) = ticket.first_response_at {
                response_minutes.push((at - ticket.created_at).num_minutes());
            }
            if let Some(at) = ticket.resolved_at {
                resolution_minutes.push((at - ticket.created_at).num_minutes());
            }
        }

        if met + missed > 0 {
            summary.resolution_compliance_percent =
                Some(met as f64 * 100.0 / (met + missed) as f64);
        }
        summary.mean_first_response_minutes = mean(&response_minutes);
        summary.mean_resolution_minutes = mean(&resolution_minutes);

        summary
    }

    /// Computes the figures for every ticket in a store.
    #[must_use]
    pub fn from_store(store: &TicketStore, now: DateTime<Utc>) -> Self {
        Self::compute(&store.all(), store.sla(), now)
    }

    /// The agent with the most active tickets.
    #[must_use]
    pub fn busiest_agent(&self) -> Option<(&str, usize)> {
        self.workload
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(agent, count)| (agent.as_str(), *count))
    }
}

fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}
