use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

/// Toast-style feedback shown to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str, severity: Severity);
}

/// Writes notifications to the log instead of a screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => {
                info!(title, body = message, severity = ?severity, "notification")
            }
            Severity::Warning => warn!(title, body = message, "notification"),
            Severity::Error => error!(title, body = message, "notification"),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|notification| notification.severity == severity)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        if let Ok(mut guard) = self.notifications.lock() {
            guard.push(Notification {
                title: title.to_string(),
                message: message.to_string(),
                severity,
            });
        }
    }
}
