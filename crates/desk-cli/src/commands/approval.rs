//! Approval command implementation.
//!
//! Handles requesting, deciding, cancelling and reminding two-stage
//! approvals (line manager, then head of department).

use std::io::Write;

use chrono::{DateTime, Utc};
use desk_approval::{ApprovalRequest, ApprovalStage, StepState};
use desk_core::{Ticket, TicketId};
use desk_rules::EvaluationResult;
use serde::Serialize;

use crate::cli::{ApprovalCommands, DecisionArgs};
use crate::error::CliError;
use crate::output::{ActionResponse, OutputFormat, TableDisplay, format_opt_time, format_time, truncate};
use crate::state::Desk;

/// Handler for approval subcommands.
pub struct ApprovalCommand<'a> {
    desk: &'a Desk,
}

impl<'a> ApprovalCommand<'a> {
    /// Creates a new approval command handler.
    #[must_use]
    pub const fn new(desk: &'a Desk) -> Self {
        Self { desk }
    }

    /// Executes the approval subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &ApprovalCommands,
    ) -> Result<(), CliError> {
        let now = Utc::now();
        let desk = self.desk;

        match command {
            ApprovalCommands::Request { ticket, reason } => {
                let id = TicketId::parse(ticket)?;
                let (request, result) = self.on_ticket(id, now, |t| {
                    desk.approvals().request(t, desk.directory(), reason, now)
                })?;
                format.write(out, &ApprovalView::new(request, result))
            }
            ApprovalCommands::Approve(args) => self.decide(out, format, args, StepState::Approved, now),
            ApprovalCommands::Reject(args) => self.decide(out, format, args, StepState::Rejected, now),
            ApprovalCommands::Cancel { request, actor } => {
                let request = desk.find_request(request)?;
                let (request, result) = self.on_ticket(request.ticket_id, now, |t| {
                    desk.approvals().cancel(request.id, t, actor, now)
                })?;
                format.write(out, &ApprovalView::new(request, result))
            }
            ApprovalCommands::Pending { approver } => {
                let requests = desk.approvals().pending_for(approver);
                format.write(out, &ApprovalList { requests })
            }
            ApprovalCommands::Show { ticket } => {
                let ticket = desk.store().require(TicketId::parse(ticket)?)?;
                let requests = desk.approvals().for_ticket(ticket.id);
                format.write(out, &ApprovalList { requests })
            }
            ApprovalCommands::Remind => {
                let sent = desk.approvals().send_reminders(
                    desk.store(),
                    desk.directory(),
                    now,
                    desk.config().reminder_after(),
                );
                format.write(
                    out,
                    &ActionResponse::ok("approvals", format!("Sent {sent} reminder(s)")),
                )
            }
        }
    }

    fn decide<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &DecisionArgs,
        decision: StepState,
        now: DateTime<Utc>,
    ) -> Result<(), CliError> {
        let desk = self.desk;
        let request = desk.find_request(&args.request)?;
        let comment = args.comment.clone();

        let (request, result) = self.on_ticket(request.ticket_id, now, |t| {
            if decision == StepState::Approved {
                desk.approvals()
                    .approve(request.id, t, desk.directory(), &args.actor, comment, now)
            } else {
                desk.approvals()
                    .reject(request.id, t, desk.directory(), &args.actor, comment, now)
            }
        })?;

        format.write(out, &ApprovalView::new(request, result))
    }

    /// Runs an approval step against a stored ticket and fires the
    /// `status_changed` automation when the ticket moved.
    fn on_ticket<F>(
        &self,
        id: TicketId,
        now: DateTime<Utc>,
        step: F,
    ) -> Result<(ApprovalRequest, EvaluationResult), CliError>
    where
        F: FnOnce(&mut Ticket) -> desk_approval::Result<ApprovalRequest>,
    {
        let before = self.desk.store().require(id)?.status;
        let request = self.desk.store().update(id, step)??;
        let after = self.desk.store().require(id)?.status;

        let result = if before == after {
            EvaluationResult::default()
        } else {
            self.desk.status_changed(id, now)?
        };
        Ok((request, result))
    }
}

// ============ Output types ============

/// One request after a change.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalView {
    /// The request.
    #[serde(flatten)]
    pub request: ApprovalRequest,
    /// Rules that ran because the ticket changed status.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules_matched: Vec<String>,
}

impl ApprovalView {
    fn new(request: ApprovalRequest, result: EvaluationResult) -> Self {
        Self {
            request,
            rules_matched: result.matched_rules,
        }
    }
}

impl TableDisplay for ApprovalView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let r = &self.request;
        writeln!(writer, "Approval {} for {}", r.id, r.ticket_id)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Status:       {}", r.status)?;
        writeln!(writer, "Requested by: {}", r.requested_by)?;
        writeln!(writer, "Reason:       {}", r.reason)?;
        writeln!(writer, "Created:      {}", format_time(r.created_at))?;
        writeln!(writer)?;

        for stage in [ApprovalStage::LineManager, ApprovalStage::HeadOfDepartment] {
            let step = r.step(stage);
            writeln!(
                writer,
                "  {:<20}  {:<12}  {:<9}  {}",
                stage.as_str(),
                step.approver,
                step.state.as_str(),
                format_opt_time(step.decided_at)
            )?;
            if let Some(comment) = &step.comment {
                writeln!(writer, "      \"{comment}\"")?;
            }
        }

        if !self.rules_matched.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Rules applied: {}", self.rules_matched.join(", "))?;
        }
        Ok(())
    }
}

/// Approval requests.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalList {
    /// Requests, oldest first.
    pub requests: Vec<ApprovalRequest>,
}

impl TableDisplay for ApprovalList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.requests.is_empty() {
            writeln!(writer, "No approval requests found")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<8}  {:<10}  {:<20}  {:<12}  {:<12}  {:<16}  {}",
            "ID", "TICKET", "STATUS", "APPROVER", "REQUESTER", "CREATED", "REASON"
        )?;
        writeln!(writer, "{}", "─".repeat(110))?;

        for request in &self.requests {
            let id = request.id.to_string();
            writeln!(
                writer,
                "{:<8}  {:<10}  {:<20}  {:<12}  {:<12}  {:<16}  {}",
                &id[..8],
                request.ticket_id.to_string(),
                request.status.as_str(),
                request.current_approver().unwrap_or("-"),
                request.requested_by,
                format_time(request.created_at),
                truncate(&request.reason, 30)
            )?;
        }

        let open = self.requests.iter().filter(|r| r.is_open()).count();
        writeln!(writer)?;
        writeln!(
            writer,
            "Total: {} request(s) ({} open)",
            self.requests.len(),
            open
        )?;
        Ok(())
    }
}
