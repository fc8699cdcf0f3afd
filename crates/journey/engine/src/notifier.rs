//! User-facing notifications
//!
//! The controller reports the outcome of every action once through a
//! [`Notifier`]. Notifications are fire-and-forget; a notifier must not
//! block.

use chrono::{DateTime, Utc};
use journey_types::{ErrorCategory, JourneyError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// One transient message for the user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Set for failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            category: None,
            timestamp: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    /// An error notification carrying the error's category
    pub fn failure(error: &JourneyError) -> Self {
        let mut n = Self::new(NotificationLevel::Error, error.to_string());
        n.category = Some(error.category());
        n
    }

    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Sink for user notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Keeps notifications in memory; used by tests and the CLI
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().last().cloned()
    }

    /// Notifications at `level`
    pub fn at_level(&self, level: NotificationLevel) -> Vec<Notification> {
        self.entries
            .lock()
            .iter()
            .filter(|n| n.level == level)
            .cloned()
            .collect()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.entries.lock().push(notification);
    }
}
