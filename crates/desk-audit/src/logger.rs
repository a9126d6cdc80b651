//! Audit logging backends.
//!
//! This module provides the [`AuditLogger`] trait and default implementations.

use std::sync::Arc;

use desk_core::TicketId;
use parking_lot::RwLock;

use crate::events::{AuditEvent, Severity};

/// Trait for audit logging backends.
///
/// Implement this trait to send the trail elsewhere (a database table, an
/// external log service).
pub trait AuditLogger: Send + Sync {
    /// Logs an audit event.
    fn log(&self, event: &AuditEvent);

    /// Logs an audit event if the severity is at or above the minimum.
    fn log_if_severe(&self, event: &AuditEvent, min_severity: Severity) {
        if event.severity >= min_severity {
            self.log(event);
        }
    }
}

/// Audit logger that uses the `tracing` infrastructure.
///
/// Events are logged at tracing levels based on severity:
/// - Info, Notice → `tracing::info!`
/// - Warning → `tracing::warn!`
/// - Error → `tracing::error!`
#[derive(Debug, Clone, Default)]
pub struct TracingAuditLogger {
    /// Optional prefix for all log messages.
    prefix: Option<String>,
}

impl TracingAuditLogger {
    /// Creates a new tracing-based audit logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new tracing-based audit logger with a prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl AuditLogger for TracingAuditLogger {
    fn log(&self, event: &AuditEvent) {
        let event_type = event.event_type();
        let ticket = event
            .ticket_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let json = event.to_json().unwrap_or_else(|_| "{}".to_string());
        let prefix = self.prefix.as_deref().unwrap_or("AUDIT");

        match event.severity {
            Severity::Info | Severity::Notice => {
                tracing::info!(
                    target: "desk_audit",
                    event_id = %event.event_id,
                    %event_type,
                    %ticket,
                    actor = %event.actor,
                    severity = %event.severity,
                    event_json = %json,
                    "[{prefix}] {event_type}"
                );
            }
            Severity::Warning => {
                tracing::warn!(
                    target: "desk_audit",
                    event_id = %event.event_id,
                    %event_type,
                    %ticket,
                    actor = %event.actor,
                    severity = %event.severity,
                    event_json = %json,
                    "[{prefix}] {event_type}"
                );
            }
            Severity::Error => {
                tracing::error!(
                    target: "desk_audit",
                    event_id = %event.event_id,
                    %event_type,
                    %ticket,
                    actor = %event.actor,
                    severity = %event.severity,
                    event_json = %json,
                    "[{prefix}] {event_type}"
                );
            }
        }
    }
}

/// Audit logger that keeps every event in memory.
///
/// Backs the ticket history view of the CLI.
#[derive(Debug, Default)]
pub struct MemoryAuditLogger {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryAuditLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a logger pre-loaded with earlier events.
    #[must_use]
    pub fn with_events(events: Vec<AuditEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }

    /// All events in the order they were logged.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    /// Events concerning one ticket, oldest first.
    #[must_use]
    pub fn history(&self, ticket_id: TicketId) -> Vec<AuditEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.ticket_id == Some(ticket_id))
            .cloned()
            .collect()
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Removes and returns every event.
    pub fn take(&self) -> Vec<AuditEvent> {
        std::mem::take(&mut *self.events.write())
    }
}

impl AuditLogger for MemoryAuditLogger {
    fn log(&self, event: &AuditEvent) {
        self.events.write().push(event.clone());
    }
}

/// A no-op audit logger for testing or disabled scenarios.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditLogger;

impl NoopAuditLogger {
    /// Creates a new no-op audit logger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AuditLogger for NoopAuditLogger {
    fn log(&self, _event: &AuditEvent) {}
}

/// A boxed audit logger for dynamic dispatch.
pub type BoxedAuditLogger = Box<dyn AuditLogger>;

impl AuditLogger for BoxedAuditLogger {
    fn log(&self, event: &AuditEvent) {
        (**self).log(event);
    }
}

impl<T: AuditLogger + ?Sized> AuditLogger for Arc<T> {
    fn log(&self, event: &AuditEvent) {
        (**self).log(event);
    }
}

/// Fans events out to several loggers.
impl<A: AuditLogger, B: AuditLogger> AuditLogger for (A, B) {
    fn log(&self, event: &AuditEvent) {
        self.0.log(event);
        self.1.log(event);
    }
}
