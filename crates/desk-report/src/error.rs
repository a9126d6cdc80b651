//! Error types for the desk-report crate.

use thiserror::Error;

/// Errors that can occur while producing reports or moving CSV data.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The CSV input lacks a required column.
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    /// CSV reading or writing failed.
    #[error("csv error: {0}")]
    Csv(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
