//! Escalation sweep command implementation.
//!
//! One sweep runs the escalation rules over every active ticket and reminds
//! approvers of overdue requests. With `--watch` the sweep repeats on an
//! interval until Ctrl-C, saving the working set after each pass.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use desk_rules::EvaluationResult;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::cli::EscalateArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, TableDisplay, format_time};
use crate::state::Desk;

/// Handler for the escalate command.
pub struct EscalateCommand<'a> {
    desk: &'a Desk,
    state: &'a Path,
}

impl<'a> EscalateCommand<'a> {
    /// Creates a new escalate command handler.
    #[must_use]
    pub const fn new(desk: &'a Desk, state: &'a Path) -> Self {
        Self { desk, state }
    }

    /// Executes the escalate command.
    ///
    /// # Errors
    ///
    /// Returns error if the interval is zero, the working set cannot be
    /// saved, or output fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &EscalateArgs,
    ) -> Result<(), CliError> {
        if !args.watch {
            return format.write(out, &self.sweep(Utc::now()));
        }

        let period = args
            .interval
            .map_or_else(|| self.desk.config().sweep_interval(), Duration::from_secs);
        if period.is_zero() {
            return Err(CliError::InvalidArgument("interval must be positive".into()));
        }

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = period.as_secs(), "watching for escalations");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.sweep(Utc::now());
                    self.desk.save(self.state)?;
                    format.write(out, &report)?;
                    out.flush()?;
                }
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("stopping escalation sweeps");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Runs one sweep.
    #[must_use]
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let evaluation = self.desk.engine().sweep(self.desk.store(), now);
        let reminders_sent = self.desk.approvals().send_reminders(
            self.desk.store(),
            self.desk.directory(),
            now,
            self.desk.config().reminder_after(),
        );

        SweepReport {
            at: now,
            evaluation,
            reminders_sent,
        }
    }
}

/// Result of one sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// When the sweep ran.
    pub at: DateTime<Utc>,
    /// Escalation rule results.
    #[serde(flatten)]
    pub evaluation: EvaluationResult,
    /// Approval reminders sent.
    pub reminders_sent: usize,
}

impl TableDisplay for SweepReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let e = &self.evaluation;
        writeln!(writer, "Escalation sweep at {}", format_time(self.at))?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Tickets scanned:    {}", e.tickets_scanned)?;
        writeln!(writer, "Rules matched:      {}", e.rules_matched)?;
        if e.rules_errored > 0 {
            writeln!(writer, "Rules with errors:  {}", e.rules_errored)?;
        }
        writeln!(writer, "Notifications:      {}", e.notifications_sent)?;
        if e.notification_failures > 0 {
            writeln!(writer, "Failed deliveries:  {}", e.notification_failures)?;
        }
        writeln!(writer, "Approval reminders: {}", self.reminders_sent)?;

        if !e.changes.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Changes")?;
            for change in &e.changes {
                writeln!(writer, "  {change}")?;
            }
        }
        Ok(())
    }
}
