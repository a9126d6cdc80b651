//! helpdesk binary entrypoint.
//!
//! This is the main entry point for the `helpdesk` command-line tool.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use desk_cli::cli::{Cli, Commands};
use desk_cli::commands::{
    ApprovalCommand, CategoryCommand, ConfigCommand, DirectoryCommand, EscalateCommand,
    MailCommand, ReportCommand, RuleCommand, TicketCommand,
};
use desk_cli::output::OutputFormat;
use desk_cli::state::Desk;
use desk_config::{DEFAULT_CONFIG_FILE, DeskConfig};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Only the implicit settings file may be absent.
    let (config_path, config) = match &cli.config {
        Some(path) => (path.clone(), DeskConfig::load(path)?),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            let config = DeskConfig::load_or_default(Some(&path))?;
            (path, config)
        }
    };

    let mut desk = Desk::open(config, &cli.state)
        .with_context(|| format!("cannot open working set {}", cli.state.display()))?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Ticket { command } => {
            let cmd = TicketCommand::new(&desk);
            cmd.execute(&mut stdout, &format, command)?;
        }
        Commands::Category { command } => {
            let cmd = CategoryCommand::new(&desk);
            cmd.execute(&mut stdout, &format, command)?;
        }
        Commands::Rule { command } => {
            let cmd = RuleCommand::new(&desk);
            cmd.execute(&mut stdout, &format, command)?;
        }
        Commands::Escalate(args) => {
            let cmd = EscalateCommand::new(&desk, &cli.state);
            cmd.execute(&mut stdout, &format, args).await?;
        }
        Commands::Approval { command } => {
            let cmd = ApprovalCommand::new(&desk);
            cmd.execute(&mut stdout, &format, command)?;
        }
        Commands::Directory { command } => {
            let mut cmd = DirectoryCommand::new(&mut desk);
            cmd.execute(&mut stdout, &format, command)?;
        }
        Commands::Mail { command } => {
            let cmd = MailCommand::new(&desk);
            cmd.execute(&mut stdout, &format, command)?;
        }
        Commands::Report => {
            let cmd = ReportCommand::new(&desk);
            cmd.summary(&mut stdout, &format)?;
        }
        Commands::Export { file } => {
            let cmd = ReportCommand::new(&desk);
            cmd.export(&mut stdout, &format, file)?;
        }
        Commands::Import { file } => {
            let cmd = ReportCommand::new(&desk);
            cmd.import(&mut stdout, &format, file)?;
        }
        Commands::Config => {
            let cmd = ConfigCommand::new(&desk, &config_path);
            cmd.execute(&mut stdout, &format)?;
        }
    }

    if cli.command.mutates() {
        desk.save(&cli.state)
            .with_context(|| format!("cannot save working set {}", cli.state.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use desk_cli::cli::{ApprovalCommands, Format, RuleCommands, TicketCommands};

    #[test]
    fn cli_parses_ticket_create() {
        let cli = Cli::parse_from([
            "helpdesk", "ticket", "create", "VPN drops", "--requester", "alice", "-p", "high",
            "-t", "vpn", "-t", "remote",
        ]);
        match cli.command {
            Commands::Ticket {
                command: TicketCommands::Create(args),
            } => {
                assert_eq!(args.subject, "VPN drops");
                assert_eq!(args.requester, "alice");
                assert_eq!(args.priority.as_deref(), Some("high"));
                assert_eq!(args.tags, vec!["vpn", "remote"]);
            }
            _ => panic!("expected ticket create command"),
        }
    }

    #[test]
    fn cli_parses_ticket_list_filters() {
        let cli = Cli::parse_from([
            "helpdesk", "ticket", "list", "-s", "open", "-s", "on_hold", "--unassigned", "--overdue",
        ]);
        match cli.command {
            Commands::Ticket {
                command: TicketCommands::List(args),
            } => {
                assert_eq!(args.statuses, vec!["open", "on_hold"]);
                assert!(args.unassigned);
                assert!(args.overdue);
            }
            _ => panic!("expected ticket list command"),
        }
    }

    #[test]
    fn cli_rejects_assignee_with_unassigned() {
        let result =
            Cli::try_parse_from(["helpdesk", "ticket", "list", "--assignee", "dave", "--unassigned"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_rule_test() {
        let cli = Cli::parse_from(["helpdesk", "rule", "test", "outage", "TKT-000001"]);
        match cli.command {
            Commands::Rule {
                command: RuleCommands::Test { id, ticket },
            } => {
                assert_eq!(id, "outage");
                assert_eq!(ticket, "TKT-000001");
            }
            _ => panic!("expected rule test command"),
        }
    }

    #[test]
    fn cli_parses_escalate_watch() {
        let cli = Cli::parse_from(["helpdesk", "escalate", "--watch", "--interval", "30"]);
        match cli.command {
            Commands::Escalate(args) => {
                assert!(args.watch);
                assert_eq!(args.interval, Some(30));
            }
            _ => panic!("expected escalate command"),
        }
    }

    #[test]
    fn cli_interval_requires_watch() {
        assert!(Cli::try_parse_from(["helpdesk", "escalate", "--interval", "30"]).is_err());
    }

    #[test]
    fn cli_parses_approval_approve() {
        let cli = Cli::parse_from([
            "helpdesk", "approval", "approve", "3f2a9c1d", "--actor", "mark", "-c", "fine",
        ]);
        match cli.command {
            Commands::Approval {
                command: ApprovalCommands::Approve(args),
            } => {
                assert_eq!(args.request, "3f2a9c1d");
                assert_eq!(args.actor, "mark");
                assert_eq!(args.comment.as_deref(), Some("fine"));
            }
            _ => panic!("expected approval approve command"),
        }
    }

    #[test]
    fn cli_global_flags() {
        let cli = Cli::parse_from([
            "helpdesk", "--state", "/tmp/desk.json", "--format", "json", "report",
        ]);
        assert_eq!(cli.state, PathBuf::from("/tmp/desk.json"));
        assert_eq!(cli.format, Format::Json);
        assert!(!cli.command.mutates());
    }

    #[test]
    fn read_only_commands_do_not_save() {
        let list = Cli::parse_from(["helpdesk", "ticket", "list"]);
        assert!(!list.command.mutates());

        let assign = Cli::parse_from(["helpdesk", "ticket", "assign", "1", "dave"]);
        assert!(assign.command.mutates());

        let pending = Cli::parse_from(["helpdesk", "approval", "pending", "mark"]);
        assert!(!pending.command.mutates());
    }
}
