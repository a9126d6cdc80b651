//! Two-stage ticket approvals.
//!
//! A ticket sent for approval waits for the requester's line manager, then
//! for the head of the requester's department. Either can reject. The
//! [`OrgDirectory`] says who those people are.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use desk_approval::{ApprovalDesk, ApprovalStatus, OrgDirectory};
//! use desk_core::{NewTicket, TicketStatus, TicketStore};
//!
//! let directory = OrgDirectory::new()
//!     .with_user("alice", "Finance", "bob")
//!     .with_head("Finance", "carol");
//!
//! let store = TicketStore::default();
//! let mut ticket = store.create(NewTicket::new("New laptop", "", "alice"), Utc::now())?;
//!
//! let desk = ApprovalDesk::new();
//! let request = desk.request(&mut ticket, &directory, "hardware purchase", Utc::now())?;
//! desk.approve(request.id, &mut ticket, &directory, "bob", None, Utc::now())?;
//! let request = desk.approve(request.id, &mut ticket, &directory, "carol", None, Utc::now())?;
//!
//! assert_eq!(request.status, ApprovalStatus::Approved);
//! assert_eq!(ticket.status, TicketStatus::Open);
//! # Ok::<(), desk_approval::ApprovalError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod desk;
pub mod directory;
pub mod error;
pub mod request;

pub use desk::{APPROVAL_SOURCE, ApprovalDesk};
pub use directory::OrgDirectory;
pub use error::{ApprovalError, Result};
pub use request::{ApprovalRequest, ApprovalStage, ApprovalStatus, ApprovalStep, StepState};
