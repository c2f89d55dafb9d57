//! User-visible notifications
//!
//! Separate from logs: a UI shows these to the user, a CLI prints them.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Info,
    /// Something was skipped or degraded
    Warning,
    /// An operation failed
    Error,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity
    pub severity: Severity,
    /// Short title
    pub title: String,
    /// Message body
    pub message: String,
}

impl Notification {
    /// Error notification
    #[must_use]
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Warning notification
    #[must_use]
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Info notification
    #[must_use]
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Sink for user-visible notifications
pub trait Notifier: Send + Sync {
    /// Show a notification
    fn notify(&self, notification: Notification);
}

/// Forwards notifications to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Error => tracing::error!(title = %n.title, "{}", n.message),
            Severity::Warning => tracing::warn!(title = %n.title, "{}", n.message),
            Severity::Info => tracing::info!(title = %n.title, "{}", n.message),
        }
    }
}

/// Keeps every notification for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Create empty recorder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications so far, oldest first
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }

    /// Drain recorded notifications
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
    }
}
