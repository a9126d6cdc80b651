//! Organisation directory command implementation.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;

use desk_approval::OrgDirectory;
use serde::Serialize;
use tracing::info;

use crate::cli::DirectoryCommands;
use crate::error::CliError;
use crate::output::{ActionResponse, OutputFormat, TableDisplay};
use crate::state::Desk;

/// Handler for directory subcommands.
pub struct DirectoryCommand<'a> {
    desk: &'a mut Desk,
}

impl<'a> DirectoryCommand<'a> {
    /// Creates a new directory command handler.
    #[must_use]
    pub fn new(desk: &'a mut Desk) -> Self {
        Self { desk }
    }

    /// Executes the directory subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn execute<W: Write>(
        &mut self,
        out: &mut W,
        format: &OutputFormat,
        command: &DirectoryCommands,
    ) -> Result<(), CliError> {
        match command {
            DirectoryCommands::Load { file } => {
                let directory = OrgDirectory::from_json(&fs::read_to_string(file)?)?;
                let users = directory.user_count();
                let departments = directory.heads.len();
                self.desk.set_directory(directory);
                info!(users, departments, "loaded directory");

                format.write(
                    out,
                    &ActionResponse::ok(
                        file.display().to_string(),
                        format!("Loaded {users} user(s) and {departments} department head(s)"),
                    ),
                )
            }
            DirectoryCommands::Show => {
                let view = DirectoryView {
                    directory: self.desk.directory().clone(),
                };
                format.write(out, &view)
            }
        }
    }
}

/// The directory as shown to operators.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryView {
    /// The directory.
    #[serde(flatten)]
    pub directory: OrgDirectory,
}

impl TableDisplay for DirectoryView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let d = &self.directory;
        let users: BTreeSet<&String> = d
            .departments
            .keys()
            .chain(d.line_managers.keys())
            .chain(d.emails.keys())
            .collect();

        if users.is_empty() && d.heads.is_empty() {
            writeln!(writer, "Directory is empty")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<16}  {:<16}  {:<16}  {}",
            "USER", "DEPARTMENT", "LINE MANAGER", "EMAIL"
        )?;
        writeln!(writer, "{}", "─".repeat(80))?;
        for user in &users {
            writeln!(
                writer,
                "{:<16}  {:<16}  {:<16}  {}",
                user,
                d.departments.get(*user).map_or("-", String::as_str),
                d.line_managers.get(*user).map_or("-", String::as_str),
                d.emails.get(*user).map_or("-", String::as_str)
            )?;
        }

        if !d.heads.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "{:<16}  {}", "DEPARTMENT", "HEAD")?;
            writeln!(writer, "{}", "─".repeat(40))?;
            for (department, head) in &d.heads {
                writeln!(writer, "{department:<16}  {head}")?;
            }
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "Total: {} user(s), {} department(s)",
            users.len(),
            d.heads.len()
        )?;
        Ok(())
    }
}
