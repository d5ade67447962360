use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use strum::Display;
use tokio::sync::broadcast;

/// How long a presentation layer keeps a toast on screen.
pub const TOAST_LIFETIME: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, Serialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// Fire-and-forget destination for user-facing notices.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, text: &str, kind: NotificationKind);

    fn success(&self, text: &str) {
        self.notify(text, NotificationKind::Success);
    }

    fn error(&self, text: &str) {
        self.notify(text, NotificationKind::Error);
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub text: String,
    pub kind: NotificationKind,
}

/// In-process toast bus. Every subscriber sees every toast published after
/// it subscribed; publishing with nobody listening is fine.
pub struct ToastBus {
    sender: broadcast::Sender<Toast>,
    next_id: AtomicU64,
}

impl ToastBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.sender.subscribe()
    }
}

impl Default for ToastBus {
    fn default() -> Self {
        Self::new(32)
    }
}

impl NotificationSink for ToastBus {
    fn notify(&self, text: &str, kind: NotificationKind) {
        let toast = Toast {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            text: text.to_string(),
            kind,
        };
        // No receivers is not an error for a fire-and-forget sink.
        let _ = self.sender.send(toast);
    }
}

/// Sink that only logs. Used when nothing renders toasts.
#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, text: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Error => tracing::warn!(kind = %kind, "{text}"),
            _ => tracing::info!(kind = %kind, "{text}"),
        }
    }
}
