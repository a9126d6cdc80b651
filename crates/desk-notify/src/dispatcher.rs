//! Fan-out of notifications to every configured channel.

use tracing::{debug, warn};

use crate::channels::NotificationChannel;
use crate::notification::{Notification, NotificationResult};

/// Outcome of dispatching one notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Channels that delivered.
    pub sent: usize,
    /// Channels that failed.
    pub failed: usize,
    /// Per-channel results, in channel order.
    pub results: Vec<NotificationResult>,
}

impl DispatchSummary {
    /// Returns true if no channel failed.
    #[must_use]
    pub const fn all_delivered(&self) -> bool {
        self.failed == 0
    }
}

/// Sends notifications through a set of channels.
///
/// A failing channel is logged and counted; the remaining channels still run.
#[derive(Debug, Default)]
pub struct Dispatcher {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl Dispatcher {
    /// Creates a dispatcher with no channels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel.
    #[must_use]
    pub fn with_channel(mut self, channel: impl NotificationChannel + 'static) -> Self {
        self.channels.push(Box::new(channel));
        self
    }

    /// Adds a boxed channel.
    pub fn add_channel(&mut self, channel: Box<dyn NotificationChannel>) {
        self.channels.push(channel);
    }

    /// Names of the configured channels.
    #[must_use]
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if no channel is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Sends a notification through every enabled channel.
    pub fn dispatch(&self, notification: &Notification) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for channel in self.channels.iter().filter(|c| c.is_enabled()) {
            let result = match channel.send(notification) {
                Ok(result) => result,
                Err(e) => NotificationResult::failure(channel.name(), e.to_string()),
            };

            if result.success {
                summary.sent += 1;
                debug!(
                    channel = %channel.name(),
                    ticket = %notification.reference,
                    "notification delivered"
                );
            } else {
                summary.failed += 1;
                warn!(
                    channel = %channel.name(),
                    ticket = %notification.reference,
                    reason = result.message.as_deref().unwrap_or("unknown"),
                    "notification failed"
                );
            }
            summary.results.push(result);
        }

        summary
    }
}
