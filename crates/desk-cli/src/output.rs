//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Outcome of a command that changes something.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    /// Whether the action succeeded.
    pub success: bool,
    /// What was acted on.
    pub target: String,
    /// Human-readable summary.
    pub message: String,
    /// Rules that matched while handling the change.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules_matched: Vec<String>,
}

impl ActionResponse {
    /// A successful action.
    #[must_use]
    pub fn ok(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            target: target.into(),
            message: message.into(),
            rules_matched: Vec::new(),
        }
    }

    /// Records the rules that ran as a consequence.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<String>) -> Self {
        self.rules_matched = rules;
        self
    }
}

impl TableDisplay for ActionResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let status = if self.success { "✓" } else { "✗" };
        writeln!(writer, "{status} {}", self.message)?;
        if !self.rules_matched.is_empty() {
            writeln!(writer, "  Rules applied: {}", self.rules_matched.join(", "))?;
        }
        Ok(())
    }
}

/// Formats a timestamp for tables.
#[must_use]
pub fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Formats an optional timestamp for tables.
#[must_use]
pub fn format_opt_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), format_time)
}

/// Shortens text to `max` characters for a table column.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
