//! User-facing notifications.
//!
//! The pipeline and the navigation guard never print or render anything
//! themselves; every message meant for a human goes through a [`Notifier`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Routes notices into the tracing stream (library default)
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        // Failures reported here are expected outcomes of a call, not faults
        match notice.level {
            NoticeLevel::Error | NoticeLevel::Warning => {
                tracing::warn!(target: "notice", "{}", notice.message)
            }
            NoticeLevel::Success | NoticeLevel::Info => {
                tracing::info!(target: "notice", "{}", notice.message)
            }
        }
    }
}

/// Keeps every notice in memory, in arrival order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices.lock().iter().filter(|n| n.level == level).count()
    }

    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_keeps_order_and_counts_by_level() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notice::warning("Please log in first"));
        notifier.notify(Notice::error("Request failed"));
        notifier.notify(Notice::error("Request failed again"));

        let notices = notifier.notices();
        assert_eq!(notices.len(), 3);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notifier.count(NoticeLevel::Error), 2);

        notifier.clear();
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn tracing_notifier_never_logs_at_error_level() {
        use std::sync::Arc;
        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::Layer;

        struct Levels(Arc<Mutex<Vec<tracing::Level>>>);

        impl<S: tracing::Subscriber> Layer<S> for Levels {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                self.0.lock().push(*event.metadata().level());
            }
        }

        let levels = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(Levels(levels.clone()));
        tracing::subscriber::with_default(subscriber, || {
            TracingNotifier.notify(Notice::error("Request failed"));
            TracingNotifier.notify(Notice::warning("Please log in first"));
            TracingNotifier.notify(Notice::success("Class created"));
        });

        assert_eq!(
            *levels.lock(),
            vec![tracing::Level::WARN, tracing::Level::WARN, tracing::Level::INFO]
        );
    }
}
