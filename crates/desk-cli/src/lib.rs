//! # desk-cli
//!
//! The `helpdesk` command-line tool.
//!
//! Provides commands for:
//! - Ticket intake, assignment, status and comments
//! - Automation and escalation rules
//! - Line manager and head of department approvals
//! - Dashboard figures and CSV export/import
//!
//! # Architecture
//!
//! Each invocation loads the working set from a JSON snapshot, assembles a
//! [`state::Desk`] from the settings file, runs one command and saves the
//! snapshot again when the command changed something.
//!
//! ```text
//! ┌──────────────┐  load   ┌──────────┐  run   ┌───────────────────────┐
//! │ state (JSON) │────────►│   Desk   │───────►│ rules / approvals /   │
//! └──────────────┘◄────────└──────────┘        │ notify / audit        │
//!                   save                       └───────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod state;

pub use cli::{Cli, Commands, Format, TicketCommands};
pub use error::CliError;
pub use output::OutputFormat;
pub use state::{Desk, Snapshot};
