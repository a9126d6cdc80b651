//! Notification channels for ticket messages.
//!
//! This module provides the [`NotificationChannel`] trait and implementations
//! for delivering notifications through various channels.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{NotifyError, Result};
use crate::notification::{Notification, NotificationKind, NotificationResult};

/// Trait for notification channels.
///
/// Implement this trait to deliver ticket notifications via different
/// protocols or services.
pub trait NotificationChannel: Send + Sync + fmt::Debug {
    /// Returns the name of this channel.
    fn name(&self) -> &str;

    /// Sends a notification through this channel.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::DeliveryFailed` if the notification cannot be sent.
    fn send(&self, notification: &Notification) -> Result<NotificationResult>;

    /// Returns true if this channel is enabled.
    fn is_enabled(&self) -> bool {
        true
    }
}

// ============ Webhook ============

/// Configuration for a webhook channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// The name of this webhook.
    pub name: String,
    /// The URL to send notifications to.
    pub url: String,
    /// HTTP headers to include with requests.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Whether this channel is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl WebhookConfig {
    /// Creates a new webhook configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::InvalidChannel` if the URL is empty.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(NotifyError::InvalidChannel {
                reason: "webhook URL cannot be empty".to_string(),
            });
        }

        Ok(Self {
            name: name.into(),
            url,
            headers: HashMap::new(),
            enabled: true,
        })
    }

    /// Adds a header to the configuration.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets whether the channel is enabled.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A webhook notification channel.
///
/// Renders notifications as JSON documents for a chat or ticket-bridge
/// endpoint. Only the payload is produced here; the HTTP hop is left to the
/// deployment.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    config: WebhookConfig,
}

impl WebhookChannel {
    /// Creates a new webhook channel with the given configuration.
    #[must_use]
    pub const fn new(config: WebhookConfig) -> Self {
        Self { config }
    }

    /// Returns the webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Formats the notification as JSON.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Serialization` if serialization fails.
    pub fn format_payload(&self, notification: &Notification) -> Result<String> {
        let payload = WebhookPayload::from_notification(notification);
        serde_json::to_string(&payload).map_err(NotifyError::from)
    }
}

impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn send(&self, notification: &Notification) -> Result<NotificationResult> {
        if !self.is_enabled() {
            debug!(channel = %self.name(), "channel is disabled, skipping");
            return Ok(NotificationResult::success(self.name())
                .with_message("channel disabled, notification skipped"));
        }

        let payload = self.format_payload(notification)?;

        info!(
            channel = %self.name(),
            url = %self.config.url,
            ticket = %notification.reference,
            kind = %notification.kind,
            "posting webhook notification"
        );
        debug!(payload = %payload, "webhook payload");

        Ok(NotificationResult::success(self.name())
            .with_message("notification queued")
            .with_delivered_to(notification.recipients.clone()))
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// The JSON body posted to webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Payload format version.
    pub version: String,
    /// Notification kind.
    pub event: NotificationKind,
    /// Ticket reference.
    pub ticket: String,
    /// Ticket subject.
    pub subject: String,
    /// Intended recipients.
    pub recipients: Vec<String>,
    /// Message text.
    pub text: String,
    /// Rule or subsystem that raised it.
    pub source: String,
}

impl WebhookPayload {
    /// Creates a payload from a notification.
    #[must_use]
    pub fn from_notification(notification: &Notification) -> Self {
        Self {
            version: "1".to_string(),
            event: notification.kind,
            ticket: notification.reference.clone(),
            subject: notification.subject.clone(),
            recipients: notification.recipients.clone(),
            text: notification.message.clone(),
            source: notification.source.clone(),
        }
    }
}

// ============ Email ============

/// A rendered plain-text e-mail waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    /// Sender address.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl OutboundEmail {
    /// Renders a notification for the given addresses.
    #[must_use]
    pub fn render(from: &str, to: Vec<String>, notification: &Notification) -> Self {
        let mut body = format!(
            "Ticket: {}\nSubject: {}\nType: {}\n\n{}\n",
            notification.reference, notification.subject, notification.kind, notification.message
        );
        if !notification.source.is_empty() {
            body.push_str("\n-- \nSent by ");
            body.push_str(&notification.source);
            body.push('\n');
        }

        Self {
            from: from.to_string(),
            to,
            subject: format!("[{}] {}", notification.reference, notification.subject),
            body,
        }
    }
}

/// Shared queue of rendered e-mails.
///
/// Clones share the same queue; whatever relays mail drains it.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    messages: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl Outbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message.
    pub fn push(&self, email: OutboundEmail) {
        self.messages.lock().push(email);
    }

    /// Removes and returns every queued message.
    pub fn drain(&self) -> Vec<OutboundEmail> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// Copies the queued messages without removing them.
    #[must_use]
    pub fn peek(&self) -> Vec<OutboundEmail> {
        self.messages.lock().clone()
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

/// E-mail notification channel.
///
/// Resolves recipients to addresses and pushes rendered messages into an
/// [`Outbox`]. SMTP delivery is not part of this crate.
#[derive(Debug, Clone)]
pub struct EmailChannel {
    name: String,
    from: String,
    outbox: Outbox,
    address_book: BTreeMap<String, String>,
    enabled: bool,
}

impl EmailChannel {
    /// Creates a new email channel.
    #[must_use]
    pub fn new(name: impl Into<String>, from: impl Into<String>, outbox: Outbox) -> Self {
        Self {
            name: name.into(),
            from: from.into(),
            outbox,
            address_book: BTreeMap::new(),
            enabled: true,
        }
    }

    /// Sets the user name to address mapping.
    #[must_use]
    pub fn with_address_book(mut self, address_book: BTreeMap<String, String>) -> Self {
        self.address_book = address_book;
        self
    }

    /// Sets whether the channel is enabled.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns the sender address.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.from
    }

    /// Resolves recipients to addresses.
    ///
    /// Addresses pass through, user names go through the address book, and
    /// anything else is dropped.
    #[must_use]
    pub fn resolve(&self, recipients: &[String]) -> Vec<String> {
        let mut resolved: Vec<String> = Vec::new();
        for recipient in recipients {
            let address = if is_address(recipient) {
                Some(recipient.clone())
            } else {
                self.address_book
                    .get(recipient)
                    .filter(|a| is_address(a))
                    .cloned()
            };

            match address {
                Some(address) if !resolved.contains(&address) => resolved.push(address),
                Some(_) => {}
                None => debug!(channel = %self.name, %recipient, "no address for recipient"),
            }
        }
        resolved
    }
}

impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, notification: &Notification) -> Result<NotificationResult> {
        if !self.is_enabled() {
            debug!(channel = %self.name(), "channel is disabled, skipping");
            return Ok(NotificationResult::success(self.name())
                .with_message("channel disabled, notification skipped"));
        }

        let to = self.resolve(&notification.recipients);
        if to.is_empty() {
            return Ok(NotificationResult::failure(
                self.name(),
                "no deliverable recipients",
            ));
        }

        let email = OutboundEmail::render(&self.from, to.clone(), notification);
        info!(
            channel = %self.name(),
            ticket = %notification.reference,
            to = ?email.to,
            "queued email notification"
        );
        self.outbox.push(email);

        Ok(NotificationResult::success(self.name()).with_delivered_to(to))
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

fn is_address(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    value.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    })
}

// ============ Log ============

/// A channel that writes notifications to the log.
#[derive(Debug, Clone)]
pub struct LogChannel {
    name: String,
    enabled: bool,
}

impl LogChannel {
    /// Creates a new log channel.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }

    /// Sets whether the channel is enabled.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::new("log")
    }
}

impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, notification: &Notification) -> Result<NotificationResult> {
        if !self.is_enabled() {
            return Ok(NotificationResult::success(self.name())
                .with_message("channel disabled"));
        }

        info!(
            ticket = %notification.reference,
            kind = %notification.kind,
            recipients = ?notification.recipients,
            source = %notification.source,
            "NOTIFY {}",
            notification.message
        );

        Ok(NotificationResult::success(self.name())
            .with_message("logged to tracing")
            .with_delivered_to(notification.recipients.clone()))
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
