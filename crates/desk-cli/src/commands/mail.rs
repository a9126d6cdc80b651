//! Outgoing e-mail command implementation.
//!
//! The e-mail channel only renders messages into the outbox; whatever relays
//! mail reads them from here.

use std::io::Write;

use desk_notify::OutboundEmail;
use serde::Serialize;

use crate::cli::MailCommands;
use crate::error::CliError;
use crate::output::{ActionResponse, OutputFormat, TableDisplay, truncate};
use crate::state::Desk;

/// Handler for mail subcommands.
pub struct MailCommand<'a> {
    desk: &'a Desk,
}

impl<'a> MailCommand<'a> {
    /// Creates a new mail command handler.
    #[must_use]
    pub const fn new(desk: &'a Desk) -> Self {
        Self { desk }
    }

    /// Executes the mail subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &MailCommands,
    ) -> Result<(), CliError> {
        match command {
            MailCommands::List => {
                let messages = self.desk.outbox().peek();
                format.write(out, &MailList { messages })
            }
            MailCommands::Clear => {
                let dropped = self.desk.outbox().drain().len();
                format.write(
                    out,
                    &ActionResponse::ok("outbox", format!("Dropped {dropped} message(s)")),
                )
            }
        }
    }
}

/// Queued e-mail.
#[derive(Debug, Clone, Serialize)]
pub struct MailList {
    /// Messages, oldest first.
    pub messages: Vec<OutboundEmail>,
}

impl TableDisplay for MailList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.messages.is_empty() {
            writeln!(writer, "Outbox is empty")?;
            return Ok(());
        }

        writeln!(writer, "{:<32}  {}", "TO", "SUBJECT")?;
        writeln!(writer, "{}", "─".repeat(80))?;
        for mail in &self.messages {
            writeln!(
                writer,
                "{:<32}  {}",
                truncate(&mail.to.join(", "), 32),
                truncate(&mail.subject, 46)
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} message(s)", self.messages.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::state::Snapshot;
    use desk_config::DeskConfig;

    fn queued() -> Snapshot {
        Snapshot {
            outbox: vec![OutboundEmail {
                from: "desk@example.com".into(),
                to: vec!["mark@example.com".into()],
                subject: "[TKT-000001] New laptop".into(),
                body: "alice needs your approval".into(),
            }],
            ..Snapshot::default()
        }
    }

    fn run(desk: &Desk, command: MailCommands) -> String {
        let mut out = Vec::new();
        MailCommand::new(desk)
            .execute(&mut out, &OutputFormat::new(Format::Table), &command)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn list_and_clear() {
        let desk = Desk::new(DeskConfig::default(), queued()).unwrap();

        let listed = run(&desk, MailCommands::List);
        assert!(listed.contains("mark@example.com"));
        assert!(listed.contains("Total: 1 message(s)"));

        assert!(run(&desk, MailCommands::Clear).contains("Dropped 1 message(s)"));
        assert!(run(&desk, MailCommands::List).contains("Outbox is empty"));
    }
}
