//! Ticket command implementation.
//!
//! Handles intake, listing, assignment, status and priority changes,
//! comments and the audit history of a ticket.

use std::io::Write;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use desk_audit::AuditEvent;
use desk_core::{
    Comment, FieldChange, NewTicket, Priority, SlaReport, SlaState, Ticket, TicketFilter, TicketId,
    TicketStatus,
};
use desk_rules::{EvaluationResult, Trigger};
use serde::Serialize;

use crate::cli::{CreateTicketArgs, ListTicketArgs, TicketCommands};
use crate::error::CliError;
use crate::output::{ActionResponse, OutputFormat, TableDisplay, format_opt_time, format_time, truncate};
use crate::state::Desk;

/// Handler for ticket subcommands.
pub struct TicketCommand<'a> {
    desk: &'a Desk,
}

impl<'a> TicketCommand<'a> {
    /// Creates a new ticket command handler.
    #[must_use]
    pub const fn new(desk: &'a Desk) -> Self {
        Self { desk }
    }

    /// Executes the ticket subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &TicketCommands,
    ) -> Result<(), CliError> {
        let now = Utc::now();
        match command {
            TicketCommands::Create(args) => self.create(out, format, args, now),
            TicketCommands::List(args) => self.list(out, format, args, now),
            TicketCommands::Show { id } => self.show(out, format, id, now),
            TicketCommands::Assign { id, agent } => {
                self.assign(out, format, id, Some(agent.as_str()), now)
            }
            TicketCommands::Unassign { id } => self.assign(out, format, id, None, now),
            TicketCommands::Status { id, status } => self.status(out, format, id, status, now),
            TicketCommands::Priority { id, priority } => {
                self.priority(out, format, id, priority, now)
            }
            TicketCommands::Comment {
                id,
                body,
                author,
                internal,
            } => self.comment(out, format, id, body, author, *internal, now),
            TicketCommands::History { id } => self.history(out, format, id),
        }
    }

    fn create<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &CreateTicketArgs,
        now: DateTime<Utc>,
    ) -> Result<(), CliError> {
        let mut form = NewTicket::new(&args.subject, &args.description, &args.requester);
        if let Some(department) = &args.department {
            form = form.with_department(department);
        }
        if let Some(category) = &args.category {
            self.desk.store().categories().require(category)?;
            form = form.with_category(category);
        }
        if let Some(priority) = &args.priority {
            form = form.with_priority(Priority::from_str(priority)?);
        }
        for tag in &args.tags {
            form = form.with_tag(tag);
        }

        let (ticket, result) = self.desk.create_ticket(form, now)?;
        let response = ActionResponse::ok(
            ticket.id.to_string(),
            format!("Created {} ({} priority)", ticket.id, ticket.priority),
        )
        .with_rules(result.matched_rules);

        format.write(out, &response)
    }

    fn list<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &ListTicketArgs,
        now: DateTime<Utc>,
    ) -> Result<(), CliError> {
        let filter = build_filter(args)?;
        let sla = self.desk.store().sla();
        let tickets = self
            .desk
            .store()
            .list(&filter, now)
            .iter()
            .map(|t| TicketSummary::new(t, sla.evaluate(t, now)))
            .collect();

        format.write(out, &TicketList { tickets })
    }

    fn show<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CliError> {
        let ticket = self.desk.store().require(TicketId::parse(id)?)?;
        let sla = self.desk.store().sla().evaluate(&ticket, now);

        format.write(out, &TicketDetail { ticket, sla })
    }

    fn assign<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
        agent: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), CliError> {
        let id = TicketId::parse(id)?;
        let store = self.desk.store();
        let change = match agent {
            Some(agent) => store.assign(id, agent, now)?,
            None => store.unassign(id, now)?,
        };
        let (ticket, result) = self.desk.record_edit(id, Trigger::TicketUpdated, change, now)?;

        let message = match &ticket.assignee {
            Some(agent) => format!("{} assigned to {agent}", ticket.id),
            None => format!("{} is unassigned", ticket.id),
        };
        format.write(out, &respond(&ticket, message, result))
    }

    fn status<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
        status: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CliError> {
        let id = TicketId::parse(id)?;
        let status = TicketStatus::from_str(status)?;
        if status == TicketStatus::PendingApproval {
            return Err(CliError::InvalidArgument(
                "use 'approval request' to send a ticket for approval".into(),
            ));
        }

        if let Some(request) = self.desk.approvals().open_for_ticket(id) {
            return Err(CliError::InvalidArgument(format!(
                "{id} is waiting on approval request {}; decide or cancel it first",
                request.id
            )));
        }

        let change = self.desk.store().transition(id, status, now)?;
        let (ticket, result) = self.desk.record_edit(id, Trigger::StatusChanged, change, now)?;

        format.write(out, &respond(&ticket, format!("{} is {}", ticket.id, ticket.status), result))
    }

    fn priority<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
        priority: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CliError> {
        let id = TicketId::parse(id)?;
        let priority = Priority::from_str(priority)?;
        let change = self.desk.store().set_priority(id, priority, now)?;
        let (ticket, result) = self.desk.record_edit(id, Trigger::TicketUpdated, change, now)?;

        format.write(
            out,
            &respond(&ticket, format!("{} is {} priority", ticket.id, ticket.priority), result),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn comment<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
        body: &str,
        author: &str,
        internal: bool,
        now: DateTime<Utc>,
    ) -> Result<(), CliError> {
        let id = TicketId::parse(id)?;
        let comment = if internal {
            Comment::internal(author, body, now)
        } else {
            Comment::public(author, body, now)
        };

        let (ticket, result) = self.desk.comment(id, comment, now)?;
        let kind = if internal { "internal note" } else { "comment" };
        format.write(out, &respond(&ticket, format!("Added {kind} to {}", ticket.id), result))
    }

    fn history<W: Write>(&self, out: &mut W, format: &OutputFormat, id: &str) -> Result<(), CliError> {
        let ticket = self.desk.store().require(TicketId::parse(id)?)?;
        let history = TicketHistory {
            ticket: ticket.id,
            events: self.desk.history(ticket.id),
        };

        format.write(out, &history)
    }
}

fn respond(ticket: &Ticket, message: String, result: EvaluationResult) -> ActionResponse {
    ActionResponse::ok(ticket.id.to_string(), message).with_rules(result.matched_rules)
}

fn build_filter(args: &ListTicketArgs) -> Result<TicketFilter, CliError> {
    let mut filter = TicketFilter::new();
    for status in &args.statuses {
        filter = filter.status(TicketStatus::from_str(status)?);
    }
    for priority in &args.priorities {
        filter = filter.priority(Priority::from_str(priority)?);
    }
    if let Some(agent) = &args.assignee {
        filter = filter.assigned_to(agent);
    }
    if args.unassigned {
        filter = filter.unassigned();
    }
    if let Some(requester) = &args.requester {
        filter = filter.requester(requester);
    }
    if let Some(department) = &args.department {
        filter = filter.department(department);
    }
    if let Some(category) = &args.category {
        filter = filter.category(category);
    }
    if let Some(tag) = &args.tag {
        filter = filter.tag(tag);
    }
    if let Some(text) = &args.text {
        filter = filter.text(text);
    }
    if args.overdue {
        filter = filter.overdue();
    }
    Ok(filter)
}

// ============ Output types ============

/// One row of the ticket list.
#[derive(Debug, Clone, Serialize)]
pub struct TicketSummary {
    /// Ticket reference.
    pub id: TicketId,
    /// Subject.
    pub subject: String,
    /// Status.
    pub status: TicketStatus,
    /// Priority.
    pub priority: Priority,
    /// Assignee.
    pub assignee: Option<String>,
    /// Requester.
    pub requester: String,
    /// Category.
    pub category: Option<String>,
    /// Resolution SLA standing.
    pub sla: Option<SlaState>,
    /// Resolution deadline.
    pub resolution_due_at: Option<DateTime<Utc>>,
}

impl TicketSummary {
    fn new(ticket: &Ticket, sla: SlaReport) -> Self {
        Self {
            id: ticket.id,
            subject: ticket.subject.clone(),
            status: ticket.status,
            priority: ticket.priority,
            assignee: ticket.assignee.clone(),
            requester: ticket.requester.clone(),
            category: ticket.category.clone(),
            sla: sla.resolution,
            resolution_due_at: ticket.resolution_due_at,
        }
    }
}

/// Ticket list.
#[derive(Debug, Clone, Serialize)]
pub struct TicketList {
    /// Matching tickets.
    pub tickets: Vec<TicketSummary>,
}

impl TableDisplay for TicketList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.tickets.is_empty() {
            writeln!(writer, "No tickets found")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<10}  {:<16}  {:<8}  {:<12}  {:<10}  {}",
            "ID", "STATUS", "PRIORITY", "ASSIGNEE", "SLA", "SUBJECT"
        )?;
        writeln!(writer, "{}", "─".repeat(100))?;

        for ticket in &self.tickets {
            writeln!(
                writer,
                "{:<10}  {:<16}  {:<8}  {:<12}  {:<10}  {}",
                ticket.id.to_string(),
                ticket.status.as_str(),
                ticket.priority.as_str(),
                ticket.assignee.as_deref().unwrap_or("-"),
                ticket.sla.map_or("-", |s| s.as_str()),
                truncate(&ticket.subject, 40)
            )?;
        }

        let breached = self
            .tickets
            .iter()
            .filter(|t| t.sla.is_some_and(|s| s.is_failure()))
            .count();
        writeln!(writer)?;
        writeln!(
            writer,
            "Total: {} ticket(s) ({} past SLA)",
            self.tickets.len(),
            breached
        )?;
        Ok(())
    }
}

/// Full view of one ticket.
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    /// The ticket.
    #[serde(flatten)]
    pub ticket: Ticket,
    /// SLA standing now.
    pub sla: SlaReport,
}

impl TableDisplay for TicketDetail {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let t = &self.ticket;
        writeln!(writer, "{}: {}", t.id, t.subject)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Status:       {}", t.status)?;
        writeln!(writer, "Priority:     {}", t.priority)?;
        writeln!(writer, "Requester:    {}", t.requester)?;
        writeln!(writer, "Department:   {}", t.department.as_deref().unwrap_or("-"))?;
        writeln!(writer, "Category:     {}", t.category.as_deref().unwrap_or("-"))?;
        writeln!(writer, "Assignee:     {}", t.assignee.as_deref().unwrap_or("-"))?;
        if !t.tags.is_empty() {
            let tags: Vec<&str> = t.tags.iter().map(String::as_str).collect();
            writeln!(writer, "Tags:         {}", tags.join(", "))?;
        }
        for (name, value) in &t.custom_fields {
            writeln!(writer, "{:<14}{value}", format!("{name}:"))?;
        }
        if t.escalation_level > 0 {
            writeln!(writer, "Escalation:   level {}", t.escalation_level)?;
        }

        writeln!(writer)?;
        writeln!(writer, "Created:      {}", format_time(t.created_at))?;
        writeln!(writer, "Updated:      {}", format_time(t.updated_at))?;
        writeln!(
            writer,
            "Response due: {} ({})",
            format_opt_time(t.response_due_at),
            self.sla.response.map_or("-", |s| s.as_str())
        )?;
        writeln!(
            writer,
            "Resolve due:  {} ({})",
            format_opt_time(t.resolution_due_at),
            self.sla.resolution.map_or("-", |s| s.as_str())
        )?;
        if let Some(resolved) = t.resolved_at {
            writeln!(writer, "Resolved:     {}", format_time(resolved))?;
        }

        if !t.description.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "{}", t.description)?;
        }

        if !t.comments.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Comments")?;
            for comment in &t.comments {
                let marker = if comment.internal { " [internal]" } else { "" };
                writeln!(
                    writer,
                    "  {} {}{marker}: {}",
                    format_time(comment.created_at),
                    comment.author,
                    comment.body
                )?;
            }
        }
        Ok(())
    }
}

/// Audit trail of one ticket.
#[derive(Debug, Clone, Serialize)]
pub struct TicketHistory {
    /// Ticket reference.
    pub ticket: TicketId,
    /// Events, oldest first.
    pub events: Vec<AuditEvent>,
}

impl TableDisplay for TicketHistory {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.events.is_empty() {
            writeln!(writer, "No history for {}", self.ticket)?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<16}  {:<14}  {:<22}  {}",
            "TIME", "ACTOR", "EVENT", "DETAIL"
        )?;
        writeln!(writer, "{}", "─".repeat(100))?;

        for event in &self.events {
            writeln!(
                writer,
                "{:<16}  {:<14}  {:<22}  {}",
                format_time(event.timestamp),
                truncate(&event.actor, 14),
                event.event_type(),
                describe(&event.kind)
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} event(s)", self.events.len())?;
        Ok(())
    }
}

fn describe(kind: &desk_audit::AuditKind) -> String {
    use desk_audit::AuditKind;

    let changes = |changes: &[FieldChange]| {
        changes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    };

    match kind {
        AuditKind::TicketCreated { subject, priority } => format!("{priority}: {subject}"),
        AuditKind::TicketUpdated { changes: c } => changes(c),
        AuditKind::CommentAdded { internal } => {
            if *internal { "internal note" } else { "public reply" }.to_string()
        }
        AuditKind::RuleApplied {
            rule_name,
            changes: c,
            ..
        } => format!("{rule_name}: {}", changes(c)),
        AuditKind::RuleFailed {
            rule_name,
            action,
            reason,
            ..
        } => format!("{rule_name}: {action} failed: {reason}"),
        AuditKind::Escalated { rule_name, level, .. } => format!("{rule_name} (level {level})"),
        AuditKind::ApprovalRequested {
            line_manager,
            head_of_department,
            ..
        } => format!("{line_manager} then {head_of_department}"),
        AuditKind::ApprovalDecided {
            stage, decision, ..
        } => format!("{stage} {decision}"),
        AuditKind::NotificationSent {
            channel,
            recipients,
        } => format!("{channel} -> {}", recipients.join(", ")),
        AuditKind::NotificationFailed { channel, reason } => format!("{channel}: {reason}"),
    }
}
