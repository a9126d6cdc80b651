//! CLI error types.

use std::path::PathBuf;

use desk_approval::ApprovalError;
use desk_config::ConfigError;
use desk_core::DeskError;
use desk_report::ReportError;
use desk_rules::RuleError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Settings could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A ticket operation failed.
    #[error(transparent)]
    Ticket(#[from] DeskError),

    /// A rule operation failed.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// An approval operation failed.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// Export or import failed.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// The working-set snapshot could not be read or written.
    #[error("state file {}: {reason}", path.display())]
    State {
        /// Snapshot path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Something named on the command line does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use desk_core::TicketId;

    #[test]
    fn cli_error_display_invalid_argument() {
        let err = CliError::InvalidArgument("bad priority".into());
        assert_eq!(err.to_string(), "invalid argument: bad priority");
    }

    #[test]
    fn cli_error_display_state() {
        let err = CliError::State {
            path: PathBuf::from("desk.json"),
            reason: "expected value".into(),
        };
        assert_eq!(err.to_string(), "state file desk.json: expected value");
    }

    #[test]
    fn ticket_errors_pass_through() {
        let err = CliError::from(DeskError::TicketNotFound(TicketId::new(7)));
        assert_eq!(err.to_string(), "ticket not found: TKT-000007");
    }

    #[test]
    fn cli_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CliError = io_err.into();
        assert!(matches!(err, CliError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
