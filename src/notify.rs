//! User-facing notifications.
//!
//! Every outcome the user should see is queued here and mirrored as a
//! `tracing` event. Front ends drain the queue after each operation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Operation succeeded.
    Success,
    /// Neutral information.
    Info,
    /// Something needs attention.
    Warning,
    /// Operation was rejected.
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        f.write_str(s)
    }
}

/// A queued message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity.
    pub level: Level,
    /// Short headline.
    pub title: String,
    /// Longer explanation.
    pub description: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.title, self.description)
    }
}

/// FIFO queue of pending notifications.
#[derive(Debug, Default)]
pub struct Notifier {
    pending: Vec<Notification>,
}

impl Notifier {
    /// Queue a notification and emit the matching log event.
    pub fn push(&mut self, level: Level, title: impl Into<String>, description: impl Into<String>) {
        let notification = Notification {
            level,
            title: title.into(),
            description: description.into(),
        };

        match level {
            Level::Success | Level::Info => {
                tracing::info!(title = %notification.title, "{}", notification.description)
            }
            Level::Warning => {
                tracing::warn!(title = %notification.title, "{}", notification.description)
            }
            Level::Error => {
                tracing::error!(title = %notification.title, "{}", notification.description)
            }
        }

        self.pending.push(notification);
    }

    /// Pending notifications, oldest first.
    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }

    /// Remove and return all pending notifications.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }
}
