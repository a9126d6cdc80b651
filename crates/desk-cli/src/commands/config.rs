//! Effective settings command implementation.

use std::io::Write;
use std::path::Path;

use desk_config::DeskConfig;
use serde::Serialize;

use crate::error::CliError;
use crate::output::{OutputFormat, TableDisplay};
use crate::state::Desk;

/// Handler for the config command.
pub struct ConfigCommand<'a> {
    desk: &'a Desk,
    source: &'a Path,
}

impl<'a> ConfigCommand<'a> {
    /// Creates a new config command handler.
    #[must_use]
    pub const fn new(desk: &'a Desk, source: &'a Path) -> Self {
        Self { desk, source }
    }

    /// Writes the settings in effect.
    ///
    /// # Errors
    ///
    /// Returns error if the settings cannot be rendered.
    pub fn execute<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let view = ConfigView {
            source: self
                .source
                .exists()
                .then(|| self.source.display().to_string()),
            settings: self.desk.config().clone(),
        };
        format.write(out, &view)
    }
}

/// Settings and where they came from.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    /// Settings file, or `None` when running on defaults.
    pub source: Option<String>,
    /// The settings.
    pub settings: DeskConfig,
}

impl TableDisplay for ConfigView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match &self.source {
            Some(path) => writeln!(writer, "# {path}")?,
            None => writeln!(writer, "# built-in defaults")?,
        }
        write!(writer, "{}", self.settings.to_toml()?)?;
        Ok(())
    }
}
