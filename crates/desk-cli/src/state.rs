//! Working set of the command line.
//!
//! The CLI is not a server: each invocation loads a JSON [`Snapshot`],
//! rebuilds the in-memory stores from it, runs one command and writes the
//! snapshot back. [`Desk`] wires the stores, rule engine, approval desk and
//! notification channels together the same way a long-running service would.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use desk_approval::{ApprovalDesk, ApprovalRequest, OrgDirectory};
use desk_audit::{AuditEvent, AuditLogger, FieldChange, MemoryAuditLogger, TracingAuditLogger};
use desk_config::DeskConfig;
use desk_core::{CategoryRegistry, Comment, NewTicket, Ticket, TicketId, TicketStore};
use desk_notify::{OutboundEmail, Outbox};
use desk_rules::{EvaluationResult, Rule, RuleEngine, Trigger};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CliError;

/// Actor recorded for changes made from the command line.
pub const CLI_ACTOR: &str = "cli";

/// Everything the CLI keeps between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tickets, in id order.
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    /// Ticket categories.
    #[serde(default)]
    pub categories: CategoryRegistry,
    /// Automation and escalation rules.
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Approval requests, open and closed.
    #[serde(default)]
    pub approvals: Vec<ApprovalRequest>,
    /// Organisation directory.
    #[serde(default)]
    pub directory: OrgDirectory,
    /// Audit trail.
    #[serde(default)]
    pub audit: Vec<AuditEvent>,
    /// E-mail not yet relayed.
    #[serde(default)]
    pub outbox: Vec<OutboundEmail>,
}

impl Snapshot {
    /// Reads a snapshot; a missing file is an empty working set.
    ///
    /// # Errors
    ///
    /// Returns `CliError::State` if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file, starting empty");
                return Ok(Self::default());
            }
            Err(e) => return Err(state_error(path, e)),
        };

        serde_json::from_str(&text).map_err(|e| state_error(path, e))
    }

    /// Writes the snapshot next to its destination and renames it into place.
    ///
    /// # Errors
    ///
    /// Returns `CliError::State` if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| state_error(path, e))?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(|e| state_error(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| state_error(path, e))?;

        debug!(path = %path.display(), tickets = self.tickets.len(), "saved state");
        Ok(())
    }
}

fn state_error(path: &Path, err: impl fmt::Display) -> CliError {
    CliError::State {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// The help desk assembled from settings and a snapshot.
pub struct Desk {
    config: DeskConfig,
    store: TicketStore,
    engine: RuleEngine,
    approvals: ApprovalDesk,
    directory: OrgDirectory,
    trail: Arc<MemoryAuditLogger>,
    audit: Arc<dyn AuditLogger>,
    outbox: Outbox,
}

impl fmt::Debug for Desk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Desk")
            .field("tickets", &self.store.len())
            .field("rules", &self.engine.rule_count())
            .field("approvals", &self.approvals.len())
            .field("outbox", &self.outbox.len())
            .finish_non_exhaustive()
    }
}

impl Desk {
    /// Builds the desk from settings and a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if a notification channel is misconfigured or a
    /// stored rule no longer validates.
    pub fn new(config: DeskConfig, snapshot: Snapshot) -> Result<Self, CliError> {
        let sla = config.sla_policies();
        let store = TicketStore::new(sla.clone());
        store.set_categories(snapshot.categories);
        for ticket in snapshot.tickets {
            store.insert(ticket);
        }

        let trail = Arc::new(MemoryAuditLogger::with_events(snapshot.audit));
        let audit: Arc<dyn AuditLogger> = Arc::new((TracingAuditLogger::new(), Arc::clone(&trail)));

        let outbox = Outbox::new();
        for mail in snapshot.outbox {
            outbox.push(mail);
        }

        let dispatcher =
            Arc::new(config.build_dispatcher(outbox.clone(), snapshot.directory.address_book())?);

        let engine = RuleEngine::new()
            .with_dispatcher(Arc::clone(&dispatcher))
            .with_audit(Arc::clone(&audit))
            .with_sla(sla);
        engine.load_rules(snapshot.rules)?;

        let approvals = ApprovalDesk::new()
            .with_dispatcher(dispatcher)
            .with_audit(Arc::clone(&audit));
        for request in snapshot.approvals {
            approvals.insert(request);
        }

        info!(
            tickets = store.len(),
            rules = engine.rule_count(),
            approvals = approvals.len(),
            "desk ready"
        );

        Ok(Self {
            config,
            store,
            engine,
            approvals,
            directory: snapshot.directory,
            trail,
            audit,
            outbox,
        })
    }

    /// Loads the snapshot at `path` and builds the desk.
    ///
    /// # Errors
    ///
    /// See [`Snapshot::load`] and [`Desk::new`].
    pub fn open(config: DeskConfig, path: &Path) -> Result<Self, CliError> {
        Self::new(config, Snapshot::load(path)?)
    }

    /// Captures the current working set.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut approvals = self.approvals.all();
        approvals.sort_by_key(|r| r.created_at);

        Snapshot {
            tickets: self.store.all(),
            categories: self.store.categories(),
            rules: self.engine.list_rules(),
            approvals,
            directory: self.directory.clone(),
            audit: self.trail.events(),
            outbox: self.outbox.peek(),
        }
    }

    /// Writes the working set to `path`.
    ///
    /// # Errors
    ///
    /// See [`Snapshot::save`].
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        self.snapshot().save(path)
    }

    // ============ Accessors ============

    /// Effective settings.
    #[must_use]
    pub const fn config(&self) -> &DeskConfig {
        &self.config
    }

    /// Ticket store.
    #[must_use]
    pub const fn store(&self) -> &TicketStore {
        &self.store
    }

    /// Rule engine.
    #[must_use]
    pub const fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Approval requests.
    #[must_use]
    pub const fn approvals(&self) -> &ApprovalDesk {
        &self.approvals
    }

    /// Organisation directory.
    #[must_use]
    pub const fn directory(&self) -> &OrgDirectory {
        &self.directory
    }

    /// Replaces the organisation directory.
    pub fn set_directory(&mut self, directory: OrgDirectory) {
        self.directory = directory;
    }

    /// Audit events of one ticket.
    #[must_use]
    pub fn history(&self, id: TicketId) -> Vec<AuditEvent> {
        self.trail.history(id)
    }

    /// Queued e-mail.
    #[must_use]
    pub const fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    // ============ Ticket operations ============

    /// Raises a ticket and runs the `ticket_created` automation.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid.
    pub fn create_ticket(
        &self,
        form: NewTicket,
        now: DateTime<Utc>,
    ) -> Result<(Ticket, EvaluationResult), CliError> {
        let ticket = self.store.create(form, now)?;
        self.audit.log(&AuditEvent::ticket_created(
            ticket.id,
            &ticket.requester,
            &ticket.subject,
            ticket.priority,
            now,
        ));

        let result = self.engine.automate(&self.store, ticket.id, Trigger::TicketCreated, now)?;
        Ok((self.store.require(ticket.id)?, result))
    }

    /// Audits a change the store made to a ticket and runs automation.
    ///
    /// Nothing is audited or triggered when `change` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticket does not exist.
    pub fn record_edit(
        &self,
        id: TicketId,
        trigger: Trigger,
        change: Option<FieldChange>,
        now: DateTime<Utc>,
    ) -> Result<(Ticket, EvaluationResult), CliError> {
        let Some(change) = change else {
            return Ok((self.store.require(id)?, EvaluationResult::default()));
        };

        self.audit
            .log(&AuditEvent::ticket_updated(id, CLI_ACTOR, vec![change], now));
        let result = self.engine.automate(&self.store, id, trigger, now)?;
        Ok((self.store.require(id)?, result))
    }

    /// Adds a comment and runs the `comment_added` automation.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticket does not exist.
    pub fn comment(
        &self,
        id: TicketId,
        comment: Comment,
        now: DateTime<Utc>,
    ) -> Result<(Ticket, EvaluationResult), CliError> {
        let author = comment.author.clone();
        let internal = comment.internal;
        self.store.add_comment(id, comment)?;
        self.audit
            .log(&AuditEvent::comment_added(id, author, internal, now));

        let result = self.engine.automate(&self.store, id, Trigger::CommentAdded, now)?;
        Ok((self.store.require(id)?, result))
    }

    /// Runs the `status_changed` automation after an approval step moved a
    /// ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticket does not exist.
    pub fn status_changed(&self, id: TicketId, now: DateTime<Utc>) -> Result<EvaluationResult, CliError> {
        Ok(self.engine.automate(&self.store, id, Trigger::StatusChanged, now)?)
    }

    /// Finds an approval request by its id or a unique prefix of it.
    ///
    /// # Errors
    ///
    /// Returns `CliError::NotFound` when nothing matches and
    /// `CliError::InvalidArgument` when the prefix is ambiguous.
    pub fn find_request(&self, reference: &str) -> Result<ApprovalRequest, CliError> {
        if let Ok(id) = Uuid::parse_str(reference) {
            return self
                .approvals
                .get(id)
                .ok_or_else(|| CliError::NotFound(format!("approval request {reference}")));
        }

        let prefix = reference.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return Err(CliError::InvalidArgument("empty request id".into()));
        }

        let mut found: Vec<ApprovalRequest> = self
            .approvals
            .all()
            .into_iter()
            .filter(|r| r.id.to_string().starts_with(&prefix))
            .collect();

        match found.len() {
            0 => Err(CliError::NotFound(format!("approval request {reference}"))),
            1 => Ok(found.remove(0)),
            n => Err(CliError::InvalidArgument(format!(
                "request id '{reference}' matches {n} requests"
            ))),
        }
    }
}
