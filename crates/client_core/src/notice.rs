use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::view::{NoticeKind, ViewState};

/// Writes notices into the view's single notice slot. Success notices remove
/// themselves after `success_ttl`; error notices stay until replaced.
#[derive(Clone)]
pub struct NoticeRenderer {
    view: ViewState,
    success_ttl: Duration,
}

impl NoticeRenderer {
    pub fn new(view: ViewState, success_ttl: Duration) -> Self {
        Self { view, success_ttl }
    }

    pub fn success(&self, text: impl Into<String>) -> u64 {
        self.show(NoticeKind::Success, text)
    }

    pub fn error(&self, text: impl Into<String>) -> u64 {
        self.show(NoticeKind::Error, text)
    }

    /// Must be called from within a tokio runtime when `kind` is success.
    pub fn show(&self, kind: NoticeKind, text: impl Into<String>) -> u64 {
        let id = self.view.show_notice(kind, text);
        if kind == NoticeKind::Success {
            let view = self.view.clone();
            let ttl = self.success_ttl;
            tokio::spawn(async move {
                sleep(ttl).await;
                if view.clear_notice(id) {
                    debug!(notice_id = id, "success notice expired");
                }
            });
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_notice_clears_after_ttl_and_not_before() {
        let view = ViewState::new();
        let notices = NoticeRenderer::new(view.clone(), Duration::from_secs(3));
        notices.success("✓ Submission successful!");
        settle().await;

        advance(Duration::from_millis(2_999)).await;
        settle().await;
        assert!(view.snapshot().notice.is_some());

        advance(Duration::from_millis(1)).await;
        settle().await;
        assert!(view.snapshot().notice.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn error_notice_persists() {
        let view = ViewState::new();
        let notices = NoticeRenderer::new(view.clone(), Duration::from_secs(3));
        notices.error("✗ Error: nope");
        settle().await;

        advance(Duration::from_secs(60)).await;
        settle().await;
        let notice = view.snapshot().notice.expect("still visible");
        assert_eq!(notice.kind, NoticeKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn expiring_success_does_not_remove_a_newer_error() {
        let view = ViewState::new();
        let notices = NoticeRenderer::new(view.clone(), Duration::from_secs(3));
        notices.success("saved");
        settle().await;

        advance(Duration::from_secs(1)).await;
        notices.error("✗ Network error: refused");

        advance(Duration::from_secs(5)).await;
        settle().await;
        let notice = view.snapshot().notice.expect("error remains");
        assert_eq!(notice.text, "✗ Network error: refused");
    }
}
