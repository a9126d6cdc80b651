//! Rule command implementation.
//!
//! Handles listing, loading, toggling and removing automation and
//! escalation rules, and explaining what a rule would do to a ticket.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use desk_core::TicketId;
use desk_rules::{DryRun, Rule, RuleError, RuleKind, parse_rules};
use serde::Serialize;
use tracing::info;

use crate::cli::RuleCommands;
use crate::error::CliError;
use crate::output::{ActionResponse, OutputFormat, TableDisplay, truncate};
use crate::state::Desk;

/// Handler for rule subcommands.
pub struct RuleCommand<'a> {
    desk: &'a Desk,
}

impl<'a> RuleCommand<'a> {
    /// Creates a new rule command handler.
    #[must_use]
    pub const fn new(desk: &'a Desk) -> Self {
        Self { desk }
    }

    /// Executes the rule subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &RuleCommands,
    ) -> Result<(), CliError> {
        match command {
            RuleCommands::List => {
                let rules = self.desk.engine().list_rules();
                format.write(out, &RuleList { rules })
            }
            RuleCommands::Add { file } => self.add(out, format, file),
            RuleCommands::Remove { id } => {
                if !self.desk.engine().remove_rule(id) {
                    return Err(RuleError::RuleNotFound { id: id.clone() }.into());
                }
                format.write(out, &ActionResponse::ok(id, format!("Rule '{id}' removed")))
            }
            RuleCommands::Enable { id } => self.toggle(out, format, id, true),
            RuleCommands::Disable { id } => self.toggle(out, format, id, false),
            RuleCommands::Test { id, ticket } => {
                let rule = self
                    .desk
                    .engine()
                    .get_rule(id)
                    .ok_or_else(|| RuleError::RuleNotFound { id: id.clone() })?;
                let ticket = self.desk.store().require(TicketId::parse(ticket)?)?;
                let preview = RulePreview {
                    ticket: ticket.id,
                    dry_run: self.desk.engine().dry_run(&rule, &ticket, Utc::now()),
                };
                format.write(out, &preview)
            }
        }
    }

    fn add<W: Write>(&self, out: &mut W, format: &OutputFormat, file: &Path) -> Result<(), CliError> {
        let json = fs::read_to_string(file)?;
        let rules = parse_rules(&json)?;

        let engine = self.desk.engine();
        if let Some(taken) = rules.iter().find(|r| engine.get_rule(&r.id).is_some()) {
            return Err(RuleError::DuplicateRule {
                id: taken.id.clone(),
            }
            .into());
        }

        let names: Vec<String> = rules.iter().map(|r| r.name.clone()).collect();
        engine.load_rules(rules)?;
        info!(count = names.len(), file = %file.display(), "loaded rules");

        let response = ActionResponse::ok(
            file.display().to_string(),
            format!("Added {} rule(s): {}", names.len(), names.join(", ")),
        );
        format.write(out, &response)
    }

    fn toggle<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
        enabled: bool,
    ) -> Result<(), CliError> {
        let engine = self.desk.engine();
        let mut rule = engine
            .get_rule(id)
            .ok_or_else(|| RuleError::RuleNotFound { id: id.to_string() })?;
        rule.enabled = enabled;
        engine.update_rule(rule)?;

        let state = if enabled { "enabled" } else { "disabled" };
        format.write(out, &ActionResponse::ok(id, format!("Rule '{id}' {state}")))
    }
}

fn describe_kind(kind: &RuleKind) -> String {
    match kind {
        RuleKind::Automation { triggers } => {
            let names: Vec<&str> = triggers.iter().map(|t| t.as_str()).collect();
            format!("on {}", names.join(","))
        }
        RuleKind::Escalation {
            after_minutes,
            basis,
        } => format!("{after_minutes}m {}", basis.as_str()),
    }
}

/// Rule list.
#[derive(Debug, Clone, Serialize)]
pub struct RuleList {
    /// Rules in scan order.
    pub rules: Vec<Rule>,
}

impl TableDisplay for RuleList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.rules.is_empty() {
            writeln!(writer, "No rules defined")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<20}  {:<10}  {:<6}  {:<8}  {:<28}  {}",
            "ID", "KIND", "ORDER", "ENABLED", "WHEN", "NAME"
        )?;
        writeln!(writer, "{}", "─".repeat(100))?;

        for rule in &self.rules {
            writeln!(
                writer,
                "{:<20}  {:<10}  {:<6}  {:<8}  {:<28}  {}",
                truncate(&rule.id, 20),
                rule.kind.as_str(),
                rule.order,
                if rule.enabled { "yes" } else { "no" },
                truncate(&describe_kind(&rule.kind), 28),
                rule.name
            )?;
        }

        let escalation = self.rules.iter().filter(|r| r.kind.is_escalation()).count();
        writeln!(writer)?;
        writeln!(
            writer,
            "Total: {} rule(s) ({} automation, {} escalation)",
            self.rules.len(),
            self.rules.len() - escalation,
            escalation
        )?;
        Ok(())
    }
}

/// Dry run of one rule against one ticket.
#[derive(Debug, Clone, Serialize)]
pub struct RulePreview {
    /// Ticket the rule was tested on.
    pub ticket: TicketId,
    /// What the rule would do.
    #[serde(flatten)]
    pub dry_run: DryRun,
}

impl TableDisplay for RulePreview {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let run = &self.dry_run;
        writeln!(writer, "Rule '{}' on {}", run.rule_name, self.ticket)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Matches:      {}", if run.matched { "yes" } else { "no" })?;
        if let Some(reached) = run.threshold_reached {
            writeln!(writer, "Threshold:    {}", if reached { "reached" } else { "not reached" })?;
        }
        if run.already_applied {
            writeln!(writer, "Already escalated by this rule")?;
        }

        if !run.conditions.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Conditions")?;
            for condition in &run.conditions {
                let mark = if condition.matched { "✓" } else { "✗" };
                writeln!(writer, "  {mark} {}", condition.condition)?;
            }
        }

        if !run.changes.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Changes")?;
            for change in &run.changes {
                writeln!(writer, "  {change}")?;
            }
        }
        if run.notifications > 0 {
            writeln!(writer, "Notifications: {}", run.notifications)?;
        }
        for error in &run.errors {
            writeln!(writer, "  ✗ {error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::state::Snapshot;
    use desk_config::DeskConfig;
    use desk_core::NewTicket;
    use tempfile::TempDir;

    const OUTAGE_RULE: &str = r#"{
        "id": "outage",
        "name": "Outages are urgent",
        "kind": { "type": "automation", "triggers": ["ticket_created"] },
        "conditions": {
            "match": "all",
            "conditions": [{ "field": "subject", "operator": "contains", "value": "outage" }]
        },
        "actions": [{ "type": "set_priority", "priority": "urgent" }]
    }"#;

    fn desk() -> Desk {
        Desk::new(DeskConfig::default(), Snapshot::default()).unwrap()
    }

    fn run(desk: &Desk, command: RuleCommands) -> Result<String, CliError> {
        let mut out = Vec::new();
        RuleCommand::new(desk).execute(&mut out, &OutputFormat::new(Format::Table), &command)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn add_outage_rule(desk: &Desk) -> TempDir {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("rules.json");
        fs::write(&file, OUTAGE_RULE).unwrap();
        run(desk, RuleCommands::Add { file }).unwrap();
        dir
    }

    #[test]
    fn add_and_list() {
        let desk = desk();
        let _dir = add_outage_rule(&desk);

        let listed = run(&desk, RuleCommands::List).unwrap();
        assert!(listed.contains("outage"));
        assert!(listed.contains("on ticket_created"));
        assert!(listed.contains("Total: 1 rule(s) (1 automation, 0 escalation)"));
    }

    #[test]
    fn adding_twice_is_rejected() {
        let desk = desk();
        let dir = add_outage_rule(&desk);

        let err = run(
            &desk,
            RuleCommands::Add {
                file: dir.path().join("rules.json"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Rule(RuleError::DuplicateRule { .. })));
    }

    #[test]
    fn disable_and_remove() {
        let desk = desk();
        let _dir = add_outage_rule(&desk);

        run(&desk, RuleCommands::Disable { id: "outage".into() }).unwrap();
        assert!(!desk.engine().get_rule("outage").unwrap().enabled);

        run(&desk, RuleCommands::Remove { id: "outage".into() }).unwrap();
        assert_eq!(desk.engine().rule_count(), 0);
        assert!(run(&desk, RuleCommands::Remove { id: "outage".into() }).is_err());
    }

    #[test]
    fn test_explains_a_match() {
        let desk = desk();
        let _dir = add_outage_rule(&desk);
        let ticket = desk
            .store()
            .create(NewTicket::new("Email outage", "", "alice"), Utc::now())
            .unwrap();

        let output = run(
            &desk,
            RuleCommands::Test {
                id: "outage".into(),
                ticket: ticket.id.to_string(),
            },
        )
        .unwrap();

        assert!(output.contains("Matches:      yes"));
        assert!(output.contains("priority: medium -> urgent"));
        assert_eq!(
            desk.store().require(ticket.id).unwrap().priority,
            desk_core::Priority::Medium
        );
    }
}
