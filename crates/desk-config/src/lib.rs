//! Settings for the helpdesk.
//!
//! Reads `helpdesk.toml`: SLA targets, escalation sweep interval, approval
//! reminders and notification channels. Every section is optional.
//!
//! ```rust
//! use std::path::Path;
//! use desk_config::DeskConfig;
//!
//! let config = DeskConfig::from_toml(
//!     "[escalation]\nsweep_interval_secs = 60\n",
//!     Path::new("helpdesk.toml"),
//! )?;
//! assert_eq!(config.sweep_interval().as_secs(), 60);
//! assert_eq!(config.sla_policies().at_risk_percent, 75);
//! # Ok::<(), desk_config::ConfigError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod settings;

pub use error::{ConfigError, Result};
pub use settings::{
    ApprovalSettings, DEFAULT_CONFIG_FILE, DeskConfig, EscalationSettings, NotificationSettings,
    SlaSettings,
};
