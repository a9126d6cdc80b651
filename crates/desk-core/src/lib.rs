//! # desk-core
//!
//! Ticket model and intake for the helpdesk.
//!
//! - **Tickets**: subject, requester, category, priority, status, assignee,
//!   tags, comments and SLA due dates
//! - **Lifecycle**: allowed status transitions, resolution and first-response
//!   stamping
//! - **Intake**: category defaults and SLA stamping on creation
//! - **Search**: [`TicketFilter`] for index pages
//! - **SLA**: per-priority targets and the [`SlaState`] of a ticket
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use desk_core::{Category, NewTicket, Priority, TicketFilter, TicketStore};
//!
//! let store = TicketStore::default();
//! store.register_category(
//!     Category::new("Network")?
//!         .with_default_priority(Priority::High)
//!         .with_default_assignee("netops"),
//! );
//!
//! let ticket = store.create(
//!     NewTicket::new("VPN down", "Cannot reach the office VPN", "alice")
//!         .with_category("Network"),
//!     Utc::now(),
//! )?;
//! assert_eq!(ticket.assignee.as_deref(), Some("netops"));
//!
//! let open = store.list(&TicketFilter::new().active(), Utc::now());
//! assert_eq!(open.len(), 1);
//! # Ok::<(), desk_core::DeskError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod category;
pub mod error;
pub mod filter;
pub mod sla;
pub mod store;
pub mod ticket;

pub use category::{Category, CategoryRegistry};
pub use error::{DeskError, Result};
pub use filter::TicketFilter;
pub use sla::{SlaPolicy, SlaPolicySet, SlaReport, SlaState};
pub use store::TicketStore;
pub use ticket::{
    Comment, FieldChange, NewTicket, Priority, Ticket, TicketId, TicketStatus,
};
