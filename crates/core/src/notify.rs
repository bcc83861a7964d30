//! Notification sink — trait for surfacing campaign completion to users.
//!
//! The tracker emits a [`CompletionNotice`] exactly once per
//! `Active -> Completed` transition. Production routes notices to the
//! customer-facing notification pipeline; tests capture them in memory.

use crate::types::CompletionNotice;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Trait for delivering completion notices. Fire-and-forget from the
/// tracker's perspective.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: CompletionNotice);
}

/// No-op sink for tests and callers that don't need notifications.
pub struct NoOpSink;

impl NotificationSink for NoOpSink {
    fn notify(&self, _notice: CompletionNotice) {}
}

/// Sink that logs each notice through tracing. Default for the CLI binary.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notice: CompletionNotice) {
        info!(
            campaign_id = %notice.campaign_id,
            title = %notice.title,
            views_gained = notice.views_gained,
            target_views = notice.target_views,
            "Campaign completed: target views reached"
        );
    }
}

/// In-memory sink that captures notices for testing.
#[derive(Default)]
pub struct CaptureSink {
    notices: Mutex<Vec<CompletionNotice>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn notices(&self) -> Vec<CompletionNotice> {
        self.notices.lock().expect("notify mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.notices.lock().expect("notify mutex poisoned").len()
    }

    pub fn clear(&self) {
        self.notices.lock().expect("notify mutex poisoned").clear();
    }
}

impl NotificationSink for CaptureSink {
    fn notify(&self, notice: CompletionNotice) {
        self.notices
            .lock()
            .expect("notify mutex poisoned")
            .push(notice);
    }
}

/// Convenience: create a no-op sink.
pub fn noop_sink() -> Arc<dyn NotificationSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_notice(title: &str) -> CompletionNotice {
        CompletionNotice {
            campaign_id: Uuid::new_v4(),
            title: title.to_string(),
            target_views: 500,
            views_gained: 612,
        }
    }

    #[test]
    fn test_capture_sink() {
        let sink = capture_sink();
        assert_eq!(sink.count(), 0);

        sink.notify(sample_notice("My Launch Video"));
        sink.notify(sample_notice("Second Video"));

        assert_eq!(sink.count(), 2);
        let notices = sink.notices();
        assert_eq!(notices[0].title, "My Launch Video");
        assert_eq!(notices[1].views_gained, 612);

        sink.clear();
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_noop_sink() {
        let sink = noop_sink();
        // Should not panic
        sink.notify(sample_notice("ignored"));
    }
}
