//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Default working-set snapshot.
pub const DEFAULT_STATE_FILE: &str = "helpdesk-state.json";

/// helpdesk - ticket desk with automation, escalation and approvals.
#[derive(Parser, Debug, Clone)]
#[command(name = "helpdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Settings file.
    #[arg(short, long, env = "HELPDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Working-set snapshot.
    #[arg(short, long, env = "HELPDESK_STATE", default_value = DEFAULT_STATE_FILE)]
    pub state: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Ticket intake and updates.
    Ticket {
        /// Ticket subcommand to execute.
        #[command(subcommand)]
        command: TicketCommands,
    },

    /// Ticket categories.
    Category {
        /// Category subcommand to execute.
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Automation and escalation rules.
    Rule {
        /// Rule subcommand to execute.
        #[command(subcommand)]
        command: RuleCommands,
    },

    /// Run escalation rules over active tickets.
    Escalate(EscalateArgs),

    /// Line manager and head of department approvals.
    Approval {
        /// Approval subcommand to execute.
        #[command(subcommand)]
        command: ApprovalCommands,
    },

    /// Organisation directory.
    Directory {
        /// Directory subcommand to execute.
        #[command(subcommand)]
        command: DirectoryCommands,
    },

    /// Outgoing e-mail.
    Mail {
        /// Mail subcommand to execute.
        #[command(subcommand)]
        command: MailCommands,
    },

    /// Dashboard summary.
    Report,

    /// Export tickets to CSV.
    Export {
        /// Destination file.
        file: PathBuf,
    },

    /// Import tickets from CSV.
    Import {
        /// Source file.
        file: PathBuf,
    },

    /// Show the effective settings.
    Config,
}

impl Commands {
    /// Returns true if the command may change the working set.
    #[must_use]
    pub const fn mutates(&self) -> bool {
        match self {
            Self::Ticket { command } => !matches!(
                command,
                TicketCommands::List(_) | TicketCommands::Show { .. } | TicketCommands::History { .. }
            ),
            Self::Category { command } => !matches!(command, CategoryCommands::List),
            Self::Rule { command } => !matches!(command, RuleCommands::List | RuleCommands::Test { .. }),
            Self::Approval { command } => !matches!(
                command,
                ApprovalCommands::Pending { .. } | ApprovalCommands::Show { .. }
            ),
            Self::Directory { command } => !matches!(command, DirectoryCommands::Show),
            Self::Mail { command } => !matches!(command, MailCommands::List),
            Self::Escalate(_) | Self::Import { .. } => true,
            Self::Report | Self::Export { .. } | Self::Config => false,
        }
    }
}

/// Ticket subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum TicketCommands {
    /// Raise a new ticket.
    Create(CreateTicketArgs),

    /// List tickets.
    List(ListTicketArgs),

    /// Show one ticket.
    Show {
        /// Ticket reference (`TKT-000042` or `42`).
        id: String,
    },

    /// Assign a ticket to an agent.
    Assign {
        /// Ticket reference.
        id: String,
        /// Agent user name.
        agent: String,
    },

    /// Remove the assignee.
    Unassign {
        /// Ticket reference.
        id: String,
    },

    /// Move a ticket to another status.
    Status {
        /// Ticket reference.
        id: String,
        /// New status (e.g. `in_progress`, `resolved`).
        status: String,
    },

    /// Change the priority.
    Priority {
        /// Ticket reference.
        id: String,
        /// New priority (`low`, `medium`, `high`, `urgent`).
        priority: String,
    },

    /// Add a comment.
    Comment {
        /// Ticket reference.
        id: String,
        /// Comment text.
        body: String,
        /// Who writes it.
        #[arg(short, long)]
        author: String,
        /// Keep it out of the requester's view.
        #[arg(short, long)]
        internal: bool,
    },

    /// Show the audit trail of a ticket.
    History {
        /// Ticket reference.
        id: String,
    },
}

/// Arguments for raising a ticket.
#[derive(Args, Debug, Clone)]
pub struct CreateTicketArgs {
    /// One-line summary.
    pub subject: String,

    /// Who needs help.
    #[arg(short, long)]
    pub requester: String,

    /// Full description.
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Requester's department.
    #[arg(long)]
    pub department: Option<String>,

    /// Category name.
    #[arg(short, long)]
    pub category: Option<String>,

    /// Priority (category default, else medium).
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Tags (repeatable).
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

/// Arguments for listing tickets.
#[derive(Args, Debug, Clone, Default)]
pub struct ListTicketArgs {
    /// Statuses to include (repeatable).
    #[arg(short, long = "status")]
    pub statuses: Vec<String>,

    /// Priorities to include (repeatable).
    #[arg(short, long = "priority")]
    pub priorities: Vec<String>,

    /// Assignee.
    #[arg(short, long, conflicts_with = "unassigned")]
    pub assignee: Option<String>,

    /// Only tickets without an assignee.
    #[arg(short, long)]
    pub unassigned: bool,

    /// Requester.
    #[arg(short, long)]
    pub requester: Option<String>,

    /// Department.
    #[arg(long)]
    pub department: Option<String>,

    /// Category.
    #[arg(short, long)]
    pub category: Option<String>,

    /// Tag.
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Text in subject or description.
    #[arg(long)]
    pub text: Option<String>,

    /// Only active tickets past their resolution due date.
    #[arg(long)]
    pub overdue: bool,
}

/// Category subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommands {
    /// List categories.
    List,

    /// Add or replace a category.
    Add {
        /// Category name.
        name: String,
        /// Description.
        #[arg(short, long, default_value = "")]
        description: String,
        /// Priority for new tickets that do not ask for one.
        #[arg(short, long)]
        priority: Option<String>,
        /// Agent new tickets are assigned to.
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// Remove a category.
    Remove {
        /// Category name.
        name: String,
    },
}

/// Rule subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum RuleCommands {
    /// List rules in scan order.
    List,

    /// Add rules from a JSON file (one rule or a list).
    Add {
        /// Rule file.
        file: PathBuf,
    },

    /// Remove a rule.
    Remove {
        /// Rule ID.
        id: String,
    },

    /// Enable a rule.
    Enable {
        /// Rule ID.
        id: String,
    },

    /// Disable a rule.
    Disable {
        /// Rule ID.
        id: String,
    },

    /// Explain what a rule would do to a ticket.
    Test {
        /// Rule ID.
        id: String,
        /// Ticket reference.
        ticket: String,
    },
}

/// Arguments for the escalate command.
#[derive(Args, Debug, Clone, Default)]
pub struct EscalateArgs {
    /// Keep sweeping until interrupted.
    #[arg(short, long)]
    pub watch: bool,

    /// Seconds between sweeps (defaults to the settings file).
    #[arg(short, long, requires = "watch")]
    pub interval: Option<u64>,
}

/// Approval subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ApprovalCommands {
    /// Send a ticket for approval.
    Request {
        /// Ticket reference.
        ticket: String,
        /// Why approval is needed.
        #[arg(short, long)]
        reason: String,
    },

    /// Approve the current step.
    Approve(DecisionArgs),

    /// Reject the current step.
    Reject(DecisionArgs),

    /// Withdraw a request.
    Cancel {
        /// Request ID (or a unique prefix).
        request: String,
        /// Who cancels.
        #[arg(short, long)]
        actor: String,
    },

    /// Requests waiting for an approver.
    Pending {
        /// Approver user name.
        approver: String,
    },

    /// Requests of a ticket.
    Show {
        /// Ticket reference.
        ticket: String,
    },

    /// Remind approvers of overdue requests.
    Remind,
}

/// Arguments for approving or rejecting.
#[derive(Args, Debug, Clone)]
pub struct DecisionArgs {
    /// Request ID (or a unique prefix).
    pub request: String,

    /// Who decides.
    #[arg(short, long)]
    pub actor: String,

    /// Remark stored with the decision.
    #[arg(short, long)]
    pub comment: Option<String>,
}

/// Directory subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DirectoryCommands {
    /// Replace the directory from a JSON file.
    Load {
        /// Directory file.
        file: PathBuf,
    },

    /// Show the directory.
    Show,
}

/// Mail subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum MailCommands {
    /// List queued e-mail.
    List,

    /// Drop queued e-mail.
    Clear,
}
