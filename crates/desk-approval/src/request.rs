//! Approval requests and their two steps.

use std::fmt;

use chrono::{DateTime, Utc};
use desk_core::TicketId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the two approval steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStage {
    /// The requester's line manager.
    LineManager,
    /// The head of the requester's department.
    HeadOfDepartment,
}

impl ApprovalStage {
    /// Returns the snake case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LineManager => "line_manager",
            Self::HeadOfDepartment => "head_of_department",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::LineManager => 0,
            Self::HeadOfDepartment => 1,
        }
    }
}

impl fmt::Display for ApprovalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Waiting for a decision.
    #[default]
    Pending,
    /// Approved by the step's approver.
    Approved,
    /// Rejected by the step's approver.
    Rejected,
    /// Not needed (line manager is also head of department).
    Skipped,
}

impl StepState {
    /// Returns the snake case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Waiting for the line manager.
    AwaitingLineManager,
    /// Line manager approved; waiting for the head of department.
    AwaitingHead,
    /// Every required step approved.
    Approved,
    /// Rejected at some step.
    Rejected,
    /// Withdrawn before a final decision.
    Cancelled,
}

impl ApprovalStatus {
    /// Returns the snake case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingLineManager => "awaiting_line_manager",
            Self::AwaitingHead => "awaiting_head",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true while a decision is outstanding.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::AwaitingLineManager | Self::AwaitingHead)
    }

    /// The stage waiting for a decision.
    #[must_use]
    pub const fn stage(&self) -> Option<ApprovalStage> {
        match self {
            Self::AwaitingLineManager => Some(ApprovalStage::LineManager),
            Self::AwaitingHead => Some(ApprovalStage::HeadOfDepartment),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Which step.
    pub stage: ApprovalStage,
    /// Who decides it.
    pub approver: String,
    /// Current state.
    pub state: StepState,
    /// When it was decided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Approver's remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ApprovalStep {
    fn pending(stage: ApprovalStage, approver: &str) -> Self {
        Self {
            stage,
            approver: approver.to_string(),
            state: StepState::Pending,
            decided_at: None,
            comment: None,
        }
    }
}

/// A request for approval of a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Request identifier.
    pub id: Uuid,
    /// The ticket awaiting approval.
    pub ticket_id: TicketId,
    /// The user the request is raised for.
    pub requested_by: String,
    /// Why approval is needed.
    pub reason: String,
    /// Line manager step, then head of department step.
    pub steps: [ApprovalStep; 2],
    /// Overall state.
    pub status: ApprovalStatus,
    /// When the request was raised.
    pub created_at: DateTime<Utc>,
    /// When the request was approved, rejected or cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Last reminder sent to the current approver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminded_at: Option<DateTime<Utc>>,
}

impl ApprovalRequest {
    /// Creates a request waiting for the line manager.
    ///
    /// When the line manager is also the head of department the head step is
    /// skipped.
    #[must_use]
    pub fn new(
        ticket_id: TicketId,
        requested_by: impl Into<String>,
        reason: impl Into<String>,
        line_manager: &str,
        head: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let mut head_step = ApprovalStep::pending(ApprovalStage::HeadOfDepartment, head);
        if line_manager == head {
            head_step.state = StepState::Skipped;
        }

        Self {
            id: Uuid::new_v4(),
            ticket_id,
            requested_by: requested_by.into(),
            reason: reason.into(),
            steps: [
                ApprovalStep::pending(ApprovalStage::LineManager, line_manager),
                head_step,
            ],
            status: ApprovalStatus::AwaitingLineManager,
            created_at: now,
            decided_at: None,
            reminded_at: None,
        }
    }

    /// The step for a stage.
    #[must_use]
    pub fn step(&self, stage: ApprovalStage) -> &ApprovalStep {
        &self.steps[stage.index()]
    }

    pub(crate) fn step_mut(&mut self, stage: ApprovalStage) -> &mut ApprovalStep {
        &mut self.steps[stage.index()]
    }

    /// The step waiting for a decision.
    #[must_use]
    pub fn current_step(&self) -> Option<&ApprovalStep> {
        self.status.stage().map(|stage| self.step(stage))
    }

    /// Who has to decide next.
    #[must_use]
    pub fn current_approver(&self) -> Option<&str> {
        self.current_step().map(|step| step.approver.as_str())
    }

    /// Returns true while a decision is outstanding.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// When the current step started waiting.
    #[must_use]
    pub fn waiting_since(&self) -> Option<DateTime<Utc>> {
        match self.status {
            ApprovalStatus::AwaitingLineManager => Some(self.created_at),
            ApprovalStatus::AwaitingHead => self
                .step(ApprovalStage::LineManager)
                .decided_at
                .or(Some(self.created_at)),
            _ => None,
        }
    }
}
