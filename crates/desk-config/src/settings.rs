//! The `helpdesk.toml` settings file.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use desk_core::{SlaPolicy, SlaPolicySet};
use desk_notify::{Dispatcher, EmailChannel, LogChannel, Outbox, WebhookChannel, WebhookConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, Result};

/// Default file name.
pub const DEFAULT_CONFIG_FILE: &str = "helpdesk.toml";

const fn default_at_risk_percent() -> u8 {
    75
}

const fn default_sweep_interval_secs() -> u64 {
    300
}

const fn default_reminder_after_hours() -> u32 {
    24
}

const fn default_true() -> bool {
    true
}

/// SLA targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlaSettings {
    /// Share of a window (1-99) after which a running clock is at risk.
    #[serde(default = "default_at_risk_percent")]
    pub at_risk_percent: u8,
    /// Per-priority overrides of the built-in targets.
    #[serde(default, rename = "policy", skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<SlaPolicy>,
}

impl Default for SlaSettings {
    fn default() -> Self {
        Self {
            at_risk_percent: default_at_risk_percent(),
            policies: Vec::new(),
        }
    }
}

/// Escalation sweep settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EscalationSettings {
    /// Seconds between sweeps in watch mode.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Approval settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalSettings {
    /// Hours a step may wait before its approver is reminded.
    #[serde(default = "default_reminder_after_hours")]
    pub reminder_after_hours: u32,
}

impl Default for ApprovalSettings {
    fn default() -> Self {
        Self {
            reminder_after_hours: default_reminder_after_hours(),
        }
    }
}

/// Notification channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationSettings {
    /// Write notifications to the log.
    #[serde(default = "default_true")]
    pub log: bool,
    /// Sender address; enables the e-mail channel when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_from: Option<String>,
    /// Webhook channels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub webhook: Vec<WebhookConfig>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            log: true,
            email_from: None,
            webhook: Vec::new(),
        }
    }
}

/// Desk settings. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeskConfig {
    /// SLA targets.
    #[serde(default)]
    pub sla: SlaSettings,
    /// Escalation sweep.
    #[serde(default)]
    pub escalation: EscalationSettings,
    /// Approvals.
    #[serde(default)]
    pub approval: ApprovalSettings,
    /// Notification channels.
    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl DeskConfig {
    /// Parses and validates settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed input and
    /// `ConfigError::Invalid` for out-of-range values.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a settings file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// errors of [`DeskConfig::from_toml`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text, path)?;
        info!(path = %path.display(), "loaded settings");
        Ok(config)
    }

    /// Loads a settings file, or returns the defaults when no path is given
    /// or the file does not exist.
    ///
    /// # Errors
    ///
    /// Same as [`DeskConfig::load`] for a file that exists.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                debug!(path = %path.display(), "settings file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Renders the settings as TOML.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Serialize` if rendering fails.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every setting.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad setting.
    pub fn validate(&self) -> Result<()> {
        if !(1..=99).contains(&self.sla.at_risk_percent) {
            return Err(ConfigError::invalid(
                "sla.at_risk_percent",
                "must be between 1 and 99",
            ));
        }

        let mut seen = HashSet::new();
        for policy in &self.sla.policies {
            let key = format!("sla.policy.{}", policy.priority);
            if !seen.insert(policy.priority) {
                return Err(ConfigError::invalid(key, "priority listed twice"));
            }
            if policy.first_response_minutes == 0 || policy.resolution_minutes == 0 {
                return Err(ConfigError::invalid(key, "minutes must be positive"));
            }
            if policy.first_response_minutes > policy.resolution_minutes {
                return Err(ConfigError::invalid(
                    key,
                    "first response cannot be due after resolution",
                ));
            }
        }

        if self.escalation.sweep_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "escalation.sweep_interval_secs",
                "must be positive",
            ));
        }

        if self.approval.reminder_after_hours == 0 {
            return Err(ConfigError::invalid(
                "approval.reminder_after_hours",
                "must be positive",
            ));
        }

        if let Some(from) = &self.notifications.email_from {
            if !from.contains('@') {
                return Err(ConfigError::invalid(
                    "notifications.email_from",
                    format!("'{from}' is not an e-mail address"),
                ));
            }
        }

        let mut names = HashSet::new();
        for hook in &self.notifications.webhook {
            let key = format!("notifications.webhook.{}", hook.name);
            if hook.name.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "notifications.webhook.name",
                    "cannot be empty",
                ));
            }
            if hook.url.trim().is_empty() {
                return Err(ConfigError::invalid(key, "url cannot be empty"));
            }
            if !names.insert(hook.name.as_str()) {
                return Err(ConfigError::invalid(key, "name used twice"));
            }
        }

        Ok(())
    }

    /// The SLA targets: built-in defaults with the file's overrides.
    #[must_use]
    pub fn sla_policies(&self) -> SlaPolicySet {
        self.sla
            .policies
            .iter()
            .fold(
                SlaPolicySet::default().with_at_risk_percent(self.sla.at_risk_percent),
                |set, policy| set.with_policy(*policy),
            )
    }

    /// Time between escalation sweeps.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.escalation.sweep_interval_secs)
    }

    /// How long an approval step may wait before a reminder.
    #[must_use]
    pub fn reminder_after(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.approval.reminder_after_hours))
    }

    /// Builds the notification dispatcher for the configured channels.
    ///
    /// E-mail goes to `outbox`; user names resolve through `address_book`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Notify` if a webhook is misconfigured.
    pub fn build_dispatcher(
        &self,
        outbox: Outbox,
        address_book: BTreeMap<String, String>,
    ) -> Result<Dispatcher> {
        let settings = &self.notifications;
        let mut dispatcher = Dispatcher::new();

        if settings.log {
            dispatcher = dispatcher.with_channel(LogChannel::default());
        }

        if let Some(from) = &settings.email_from {
            dispatcher = dispatcher
                .with_channel(EmailChannel::new("email", from, outbox).with_address_book(address_book));
        }

        for hook in &settings.webhook {
            let config = WebhookConfig::new(&hook.name, &hook.url)?.enabled(hook.enabled);
            let config = hook
                .headers
                .iter()
                .fold(config, |config, (key, value)| config.with_header(key, value));
            dispatcher = dispatcher.with_channel(WebhookChannel::new(config));
        }

        debug!(channels = ?dispatcher.channel_names(), "built notification dispatcher");
        Ok(dispatcher)
    }
}
