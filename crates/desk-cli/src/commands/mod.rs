//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`ticket`] - Ticket intake and updates
//! - [`category`] - Ticket categories
//! - [`rule`] - Automation and escalation rules
//! - [`escalate`] - Escalation sweeps
//! - [`approval`] - Two-stage approvals
//! - [`directory`] - Organisation directory
//! - [`mail`] - Outgoing e-mail
//! - [`report`] - Dashboard, CSV export and import
//! - [`config`] - Effective settings

pub mod approval;
pub mod category;
pub mod config;
pub mod directory;
pub mod escalate;
pub mod mail;
pub mod report;
pub mod rule;
pub mod ticket;

pub use approval::ApprovalCommand;
pub use category::CategoryCommand;
pub use config::ConfigCommand;
pub use directory::DirectoryCommand;
pub use escalate::EscalateCommand;
pub use mail::MailCommand;
pub use report::ReportCommand;
pub use rule::RuleCommand;
pub use ticket::TicketCommand;
