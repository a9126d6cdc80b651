//! # desk-audit
//!
//! Audit trail for ticket activity.
//!
//! Every change the desk makes to a ticket, whether by an agent, an
//! automation rule, an escalation or the approval workflow, is described by an
//! [`AuditEvent`] and handed to an [`AuditLogger`].
//!
//! - [`TracingAuditLogger`]: writes events through `tracing`
//! - [`MemoryAuditLogger`]: keeps events for ticket history views and tests
//! - [`NoopAuditLogger`]: discards everything
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use desk_audit::{AuditEvent, AuditLogger, FieldChange, MemoryAuditLogger};
//! use desk_core::TicketId;
//!
//! let logger = MemoryAuditLogger::new();
//! let id = TicketId::new(7);
//!
//! logger.log(&AuditEvent::ticket_updated(
//!     id,
//!     "dave",
//!     vec![FieldChange::new("priority", Some("medium"), Some("high"))],
//!     Utc::now(),
//! ));
//!
//! assert_eq!(logger.history(id).len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod logger;

pub use error::{AuditError, Result};
pub use events::{AuditEvent, AuditKind, FieldChange, Severity};
pub use logger::{AuditLogger, BoxedAuditLogger, MemoryAuditLogger, NoopAuditLogger, TracingAuditLogger};
