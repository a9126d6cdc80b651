//! Category command implementation.

use std::io::Write;
use std::str::FromStr;

use desk_core::{Category, Priority};
use serde::Serialize;

use crate::cli::CategoryCommands;
use crate::error::CliError;
use crate::output::{ActionResponse, OutputFormat, TableDisplay, truncate};
use crate::state::Desk;

/// Handler for category subcommands.
pub struct CategoryCommand<'a> {
    desk: &'a Desk,
}

impl<'a> CategoryCommand<'a> {
    /// Creates a new category command handler.
    #[must_use]
    pub const fn new(desk: &'a Desk) -> Self {
        Self { desk }
    }

    /// Executes the category subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &CategoryCommands,
    ) -> Result<(), CliError> {
        match command {
            CategoryCommands::List => {
                let categories = self.desk.store().categories().iter().cloned().collect();
                format.write(out, &CategoryList { categories })
            }
            CategoryCommands::Add {
                name,
                description,
                priority,
                assignee,
            } => {
                let mut category = Category::new(name)?.with_description(description);
                if let Some(priority) = priority {
                    category = category.with_default_priority(Priority::from_str(priority)?);
                }
                if let Some(agent) = assignee {
                    category = category.with_default_assignee(agent);
                }

                let name = category.name.clone();
                self.desk.store().register_category(category);
                format.write(out, &ActionResponse::ok(&name, format!("Category '{name}' saved")))
            }
            CategoryCommands::Remove { name } => {
                let mut registry = self.desk.store().categories();
                let removed = registry.require(name)?.name.clone();
                registry.remove(name);
                self.desk.store().set_categories(registry);
                format.write(
                    out,
                    &ActionResponse::ok(&removed, format!("Category '{removed}' removed")),
                )
            }
        }
    }
}

/// Category list.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryList {
    /// Categories by name.
    pub categories: Vec<Category>,
}

impl TableDisplay for CategoryList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.categories.is_empty() {
            writeln!(writer, "No categories defined")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<20}  {:<10}  {:<12}  {}",
            "NAME", "PRIORITY", "ASSIGNEE", "DESCRIPTION"
        )?;
        writeln!(writer, "{}", "─".repeat(80))?;

        for category in &self.categories {
            writeln!(
                writer,
                "{:<20}  {:<10}  {:<12}  {}",
                truncate(&category.name, 20),
                category.default_priority.map_or("-", |p| p.as_str()),
                category.default_assignee.as_deref().unwrap_or("-"),
                truncate(&category.description, 40)
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} category(ies)", self.categories.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::state::Snapshot;
    use desk_config::DeskConfig;

    fn run(desk: &Desk, command: CategoryCommands) -> Result<String, CliError> {
        let mut out = Vec::new();
        CategoryCommand::new(desk).execute(&mut out, &OutputFormat::new(Format::Table), &command)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn add_list_remove() {
        let desk = Desk::new(DeskConfig::default(), Snapshot::default()).unwrap();

        run(
            &desk,
            CategoryCommands::Add {
                name: "Hardware".into(),
                description: "Laptops and printers".into(),
                priority: Some("high".into()),
                assignee: Some("dave".into()),
            },
        )
        .unwrap();

        let listed = run(&desk, CategoryCommands::List).unwrap();
        assert!(listed.contains("Hardware"));
        assert!(listed.contains("high"));
        assert!(listed.contains("dave"));

        run(&desk, CategoryCommands::Remove { name: "hardware".into() }).unwrap();
        assert!(run(&desk, CategoryCommands::List).unwrap().contains("No categories defined"));
    }

    #[test]
    fn removing_unknown_category_fails() {
        let desk = Desk::new(DeskConfig::default(), Snapshot::default()).unwrap();
        let err = run(&desk, CategoryCommands::Remove { name: "Nope".into() }).unwrap_err();
        assert!(matches!(err, CliError::Ticket(_)));
    }
}
