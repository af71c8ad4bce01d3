//! User-facing notifications — a one-way, fire-and-forget message sink.
//!
//! The orchestrator never renders anything; it hands `Notification`s to a
//! host-provided sink and moves on. Duplicate suppression lives here in a
//! sink decorator, not in the orchestrator.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Suppression window for duplicate notifications.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A user-facing message. No reply is ever consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: None,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Fire-and-forget notification sink implemented by the host (toast renderer,
/// desktop notifications, test recorder).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<S: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<S> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Decorator that drops a notification identical to the previously delivered
/// one (`kind`, `title`, and `message` all equal) within the window.
///
/// Rapid re-renders and double-invocation in development produce back-to-back
/// duplicates; one toast is enough.
pub struct DebouncedSink<S> {
    inner: S,
    window: Duration,
    last: Mutex<Option<(Notification, Instant)>>,
}

impl<S: NotificationSink> DebouncedSink<S> {
    pub fn new(inner: S) -> Self {
        Self::with_window(inner, DEFAULT_DEBOUNCE_WINDOW)
    }

    pub fn with_window(inner: S, window: Duration) -> Self {
        Self {
            inner,
            window,
            last: Mutex::new(None),
        }
    }
}

impl<S: NotificationSink> NotificationSink for DebouncedSink<S> {
    fn notify(&self, notification: Notification) {
        let now = Instant::now();
        let mut last = self.last.lock().expect("debounce lock poisoned");
        if let Some((previous, delivered_at)) = last.as_ref() {
            if *previous == notification && now.duration_since(*delivered_at) < self.window {
                tracing::debug!(title = %notification.title, "duplicate notification suppressed");
                return;
            }
        }
        *last = Some((notification.clone(), now));
        drop(last);
        self.inner.notify(notification);
    }
}
