//! Reporting for the helpdesk.
//!
//! Dashboard figures over a set of tickets, and CSV export and import.
//!
//! ```rust
//! use chrono::Utc;
//! use desk_core::{NewTicket, TicketStore};
//! use desk_report::{DashboardSummary, export_csv, import_csv};
//!
//! let store = TicketStore::default();
//! store.create(NewTicket::new("Printer jam", "", "alice"), Utc::now())?;
//!
//! let summary = DashboardSummary::from_store(&store, Utc::now());
//! assert_eq!(summary.unassigned, 1);
//!
//! let mut csv = Vec::new();
//! export_csv(&store.all(), &mut csv)?;
//! let report = import_csv(csv.as_slice())?;
//! assert_eq!(report.tickets.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod summary;
pub mod transfer;

pub use error::{ReportError, Result};
pub use summary::{DashboardSummary, UNCATEGORIZED};
pub use transfer::{
    ImportReport, ImportRowError, REQUIRED_COLUMNS, TAG_SEPARATOR, export_csv, import_csv,
};
