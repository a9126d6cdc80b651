//! CSV export and import of tickets.

use std::io::{Read, Write};
use std::str::FromStr;

use desk_core::{NewTicket, Priority, Ticket};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ReportError, Result};

/// Separator for tags inside one CSV field.
pub const TAG_SEPARATOR: &str = ";";

/// Columns an import must have.
pub const REQUIRED_COLUMNS: [&str; 2] = ["subject", "requester"];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    reference: String,
    subject: &'a str,
    status: &'static str,
    priority: &'static str,
    category: &'a str,
    assignee: &'a str,
    requester: &'a str,
    department: &'a str,
    tags: String,
    created_at: String,
    resolved_at: String,
}

impl<'a> ExportRow<'a> {
    fn new(ticket: &'a Ticket) -> Self {
        let tags: Vec<&str> = ticket.tags.iter().map(String::as_str).collect();
        Self {
            reference: ticket.id.to_string(),
            subject: &ticket.subject,
            status: ticket.status.as_str(),
            priority: ticket.priority.as_str(),
            category: ticket.category.as_deref().unwrap_or_default(),
            assignee: ticket.assignee.as_deref().unwrap_or_default(),
            requester: &ticket.requester,
            department: ticket.department.as_deref().unwrap_or_default(),
            tags: tags.join(TAG_SEPARATOR),
            created_at: ticket.created_at.to_rfc3339(),
            resolved_at: ticket
                .resolved_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

/// Writes tickets as CSV with a header row.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns `ReportError::Csv` if writing fails.
pub fn export_csv<W: Write>(tickets: &[Ticket], writer: W) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);

    if tickets.is_empty() {
        csv.write_record([
            "reference",
            "subject",
            "status",
            "priority",
            "category",
            "assignee",
            "requester",
            "department",
            "tags",
            "created_at",
            "resolved_at",
        ])?;
    }

    for ticket in tickets {
        csv.serialize(ExportRow::new(ticket))?;
    }
    csv.flush()?;

    info!(rows = tickets.len(), "exported tickets");
    Ok(tickets.len())
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    subject: String,
    #[serde(default)]
    description: Option<String>,
    requester: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    tags: Option<String>,
}

impl ImportRow {
    fn into_ticket(self) -> std::result::Result<NewTicket, String> {
        let mut form = NewTicket::new(
            self.subject,
            self.description.unwrap_or_default(),
            self.requester,
        );

        if let Some(priority) = present(self.priority) {
            form = form.with_priority(Priority::from_str(&priority).map_err(|e| e.to_string())?);
        }
        if let Some(category) = present(self.category) {
            form = form.with_category(category);
        }
        if let Some(department) = present(self.department) {
            form = form.with_department(department);
        }
        for tag in self
            .tags
            .iter()
            .flat_map(|tags| tags.split(TAG_SEPARATOR))
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
        {
            form = form.with_tag(tag);
        }

        form.validate().map_err(|e| e.to_string())?;
        Ok(form)
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowError {
    /// Line number in the input (the header is line 1).
    pub line: u64,
    /// What was wrong.
    pub reason: String,
}

/// Result of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Valid intake forms, in input order.
    pub tickets: Vec<NewTicket>,
    /// Rows that were skipped.
    pub errors: Vec<ImportRowError>,
}

impl ImportReport {
    /// Returns true if every row was imported.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Reads intake forms from CSV.
///
/// The header names the columns; `subject` and `requester` are required,
/// `description`, `priority`, `category`, `department` and `tags` are
/// optional. Bad rows are reported and skipped.
///
/// # Errors
///
/// Returns `ReportError::MissingColumn` if a required column is absent, or
/// `ReportError::Csv` if the header cannot be read.
pub fn import_csv<R: Read>(reader: R) -> Result<ImportReport> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv.headers()?.clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.eq_ignore_ascii_case(column)) {
            return Err(ReportError::MissingColumn(column.to_string()));
        }
    }
    let headers = csv::StringRecord::from(
        headers
            .iter()
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>(),
    );

    let mut report = ImportReport::default();
    let mut last_line = 1;
    for result in csv.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(last_line + 1, csv::Position::line);
                last_line = line;
                report.errors.push(ImportRowError {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = record.position().map_or(last_line + 1, csv::Position::line);
        last_line = line;

        let parsed = record
            .deserialize::<ImportRow>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(ImportRow::into_ticket);

        match parsed {
            Ok(form) => report.tickets.push(form),
            Err(reason) => {
                debug!(line, reason = %reason, "skipped import row");
                report.errors.push(ImportRowError { line, reason });
            }
        }
    }

    info!(
        imported = report.tickets.len(),
        skipped = report.errors.len(),
        "imported tickets"
    );
    Ok(report)
}
