//! Transient user notifications
//!
//! Repositories and screens report outcomes through a `Notifier`. The
//! presentation layer decides how (or whether) to show them.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Maximum history entries kept by `NotificationQueue`
const MAX_HISTORY_ENTRIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotificationLevel, message: &str);

    fn success(&self, message: &str) {
        self.notify(NotificationLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(NotificationLevel::Error, message);
    }
}

/// Forwards notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        match level {
            NotificationLevel::Error => log::error!("[notify] {}", message),
            NotificationLevel::Warning => log::warn!("[notify] {}", message),
            NotificationLevel::Info | NotificationLevel::Success => log::info!("[notify] {}", message),
        }
    }
}

/// Bounded in-memory queue a UI can drain
#[derive(Debug, Default)]
pub struct NotificationQueue {
    entries: Mutex<VecDeque<Notification>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything queued so far
    pub fn drain(&self) -> Vec<Notification> {
        match self.entries.lock() {
            Ok(mut entries) => entries.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, level: NotificationLevel, message: &str) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() >= MAX_HISTORY_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(Notification {
            level,
            message: message.to_string(),
        });
    }
}
