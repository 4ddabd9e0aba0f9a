//! User-facing notifications and session update fan-out

use crate::session::SessionView;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Error,
}

/// Toast-style message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
            at: Utc::now(),
        }
    }
}

/// Both hooks run while the controller holds its session lock, so updates
/// arrive in the order the session changed. Implementations must not block
/// for long or call back into the controller.
pub trait Notifier: Send + Sync {
    /// Surface a notice to the user
    fn notify(&self, notice: &Notice);

    /// Called after every change to the session
    fn session_updated(&self, _view: &SessionView) {}
}

/// Logs notices; for controllers nobody is watching
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        tracing::warn!(
            level = ?notice.level,
            title = %notice.title,
            description = %notice.description,
            "User notice"
        );
    }
}

/// Events delivered to stream subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Updated(SessionView),
    Notice(Notice),
}

/// Publishes session events on a broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<SessionEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Open event streams
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notice: &Notice) {
        TracingNotifier.notify(notice);
        // No subscribers is fine
        let _ = self.tx.send(SessionEvent::Notice(notice.clone()));
    }

    fn session_updated(&self, view: &SessionView) {
        let _ = self.tx.send(SessionEvent::Updated(view.clone()));
    }
}
