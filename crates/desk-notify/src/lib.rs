//! Ticket notifications for the helpdesk.
//!
//! `desk-notify` turns ticket events into [`Notification`]s and delivers them
//! through pluggable channels.
//!
//! # Features
//!
//! - **Channels**: log, webhook (JSON payload) and e-mail (rendered into an [`Outbox`])
//! - **Address book**: user names resolve to addresses for e-mail
//! - **Dispatcher**: fans out to every enabled channel and keeps going on failure
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use desk_core::{NewTicket, TicketStore};
//! use desk_notify::{Dispatcher, EmailChannel, LogChannel, Notification, NotificationKind, Outbox};
//!
//! let store = TicketStore::default();
//! let ticket = store.create(NewTicket::new("VPN down", "", "alice"), Utc::now())?;
//!
//! let outbox = Outbox::new();
//! let dispatcher = Dispatcher::new()
//!     .with_channel(LogChannel::default())
//!     .with_channel(EmailChannel::new("email", "helpdesk@example.com", outbox.clone()));
//!
//! let notification = Notification::for_ticket(&ticket, NotificationKind::RuleAction, "New VPN ticket")
//!     .with_recipient("netops@example.com");
//! let summary = dispatcher.dispatch(&notification);
//!
//! assert_eq!(summary.sent, 2);
//! assert_eq!(outbox.drain()[0].subject, "[TKT-000001] VPN down");
//! # Ok::<(), desk_core::DeskError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod notification;

pub use channels::{
    EmailChannel, LogChannel, NotificationChannel, OutboundEmail, Outbox, WebhookChannel,
    WebhookConfig, WebhookPayload,
};
pub use dispatcher::{DispatchSummary, Dispatcher};
pub use error::{NotifyError, Result};
pub use notification::{Notification, NotificationKind, NotificationResult};
