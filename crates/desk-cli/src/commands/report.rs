//! Reporting command implementations.
//!
//! Handles the dashboard summary and CSV export and import.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use desk_core::TicketId;
use desk_report::{DashboardSummary, ImportRowError, export_csv, import_csv};
use serde::Serialize;
use tracing::warn;

use crate::error::CliError;
use crate::output::{ActionResponse, OutputFormat, TableDisplay, format_time};
use crate::state::Desk;

/// Handler for the report, export and import commands.
pub struct ReportCommand<'a> {
    desk: &'a Desk,
}

impl<'a> ReportCommand<'a> {
    /// Creates a new report command handler.
    #[must_use]
    pub const fn new(desk: &'a Desk) -> Self {
        Self { desk }
    }

    /// Writes the dashboard summary.
    ///
    /// # Errors
    ///
    /// Returns error if output fails.
    pub fn summary<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let summary = DashboardSummary::from_store(self.desk.store(), Utc::now());
        format.write(out, &summary)
    }

    /// Exports every ticket to a CSV file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn export<W: Write>(&self, out: &mut W, format: &OutputFormat, file: &Path) -> Result<(), CliError> {
        let writer = BufWriter::new(File::create(file)?);
        let rows = export_csv(&self.desk.store().all(), writer)?;

        format.write(
            out,
            &ActionResponse::ok(
                file.display().to_string(),
                format!("Exported {rows} ticket(s) to {}", file.display()),
            ),
        )
    }

    /// Raises tickets from a CSV file.
    ///
    /// Bad rows are skipped and listed; good rows go through intake and
    /// `ticket_created` automation like any other ticket.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or lacks required columns.
    pub fn import<W: Write>(&self, out: &mut W, format: &OutputFormat, file: &Path) -> Result<(), CliError> {
        let report = import_csv(BufReader::new(File::open(file)?))?;
        let now = Utc::now();

        let mut created = Vec::with_capacity(report.tickets.len());
        for form in report.tickets {
            let (ticket, _) = self.desk.create_ticket(form, now)?;
            created.push(ticket.id);
        }
        for error in &report.errors {
            warn!(line = error.line, reason = %error.reason, "skipped import row");
        }

        let summary = ImportSummary {
            created,
            errors: report.errors,
        };
        format.write(out, &summary)
    }
}

impl TableDisplay for DashboardSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let percent = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}%"));
        let minutes = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.0} min"));

        writeln!(writer, "Helpdesk Dashboard ({})", format_time(self.generated_at))?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Tickets:          {} ({} active)", self.total, self.active)?;
        writeln!(writer, "Unassigned:       {}", self.unassigned)?;
        if let Some((agent, count)) = self.busiest_agent() {
            writeln!(writer, "Busiest agent:    {agent} ({count} active)")?;
        }
        writeln!(writer, "SLA breached:     {}", self.sla_breaches)?;
        writeln!(writer, "SLA at risk:      {}", self.sla_at_risk)?;
        writeln!(writer, "SLA compliance:   {}", percent(self.resolution_compliance_percent))?;
        writeln!(writer, "First response:   {}", minutes(self.mean_first_response_minutes))?;
        writeln!(writer, "Resolution:       {}", minutes(self.mean_resolution_minutes))?;

        writeln!(writer)?;
        writeln!(writer, "By status")?;
        for (status, count) in &self.by_status {
            writeln!(writer, "  {status:<18}{count}")?;
        }

        writeln!(writer)?;
        writeln!(writer, "By priority")?;
        for (priority, count) in &self.by_priority {
            writeln!(writer, "  {priority:<18}{count}")?;
        }

        if !self.by_category.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "By category")?;
            for (category, count) in &self.by_category {
                writeln!(writer, "  {category:<18}{count}")?;
            }
        }

        if !self.workload.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Workload")?;
            for (agent, count) in &self.workload {
                writeln!(writer, "  {agent:<18}{count}")?;
            }
        }
        Ok(())
    }
}

/// Result of an import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    /// Tickets raised.
    pub created: Vec<TicketId>,
    /// Rows skipped.
    pub errors: Vec<ImportRowError>,
}

impl TableDisplay for ImportSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let mark = if self.errors.is_empty() { "✓" } else { "✗" };
        writeln!(
            writer,
            "{mark} Imported {} ticket(s), skipped {} row(s)",
            self.created.len(),
            self.errors.len()
        )?;
        for error in &self.errors {
            writeln!(writer, "  line {}: {}", error.line, error.reason)?;
        }
        Ok(())
    }
}
