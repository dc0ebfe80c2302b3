//! User-facing notifications.
//!
//! One notification is visible at a time; a new one replaces the old. Each
//! carries an id so a dismiss timer only hides the notification it was
//! scheduled for.

use std::time::Duration;
use tracing::{debug, instrument};

/// Default time a notification stays visible.
pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(3);

/// Notification tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Informational / positive.
    Success,
    /// Something went wrong.
    Error,
}

/// Identifies one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("notice#{_0}")]
pub struct NotificationId(u64);

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Id for dismissal.
    pub id: NotificationId,
    /// Text to show.
    pub message: String,
    /// Tone.
    pub severity: Severity,
}

/// Holds the visible notification.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    current: Option<Notification>,
    next_id: u64,
    timeout: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TIMEOUT)
    }
}

impl NotificationCenter {
    /// Creates an empty center whose notifications last `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            current: None,
            next_id: 0,
            timeout,
        }
    }

    /// Auto-dismiss timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Shows a notification, replacing any visible one.
    #[instrument(skip(self, message))]
    pub fn show(&mut self, message: impl Into<String>, severity: Severity) -> Notification {
        self.next_id += 1;
        let notification = Notification {
            id: NotificationId(self.next_id),
            message: message.into(),
            severity,
        };
        debug!(id = %notification.id, message = %notification.message, "Showing notification");
        self.current = Some(notification.clone());
        notification
    }

    /// Hides the notification `id` if it is still the visible one.
    #[instrument(skip(self))]
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        match &self.current {
            Some(current) if current.id == id => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// The visible notification.
    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }
}
