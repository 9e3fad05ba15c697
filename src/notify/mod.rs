//! Transient user-facing notices.
//!
//! The runtime is headless; anything the original surfaced as a toast or
//! overlay animation flows through this channel for the host UI to drain.

use tokio::sync::mpsc;
use tracing::debug;

/// A transient message for the host UI. None of these block or persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
    /// Double-tap like feedback: run the heart overlay on this item.
    HeartBurst { item_id: String },
}

/// Cloneable sender handle for notices.
#[derive(Clone)]
pub struct NoticeHandle {
    tx: mpsc::Sender<Notice>,
}

impl NoticeHandle {
    /// Create a notice channel; the host keeps the receiver.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(Notice::Info(message.into()));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Notice::Error(message.into()));
    }

    pub fn heart_burst(&self, item_id: impl Into<String>) {
        self.send(Notice::HeartBurst {
            item_id: item_id.into(),
        });
    }

    fn send(&self, notice: Notice) {
        // Notices are best-effort; a slow host drops them rather than
        // stalling the feed.
        if let Err(e) = self.tx.try_send(notice) {
            debug!("Dropped notice: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notices_arrive_in_order() {
        let (handle, mut rx) = NoticeHandle::channel(8);
        handle.info("loaded");
        handle.heart_burst("post-1");

        assert_eq!(rx.recv().await, Some(Notice::Info("loaded".into())));
        assert_eq!(
            rx.recv().await,
            Some(Notice::HeartBurst {
                item_id: "post-1".into()
            })
        );
    }

    #[tokio::test]
    async fn test_full_channel_drops_instead_of_blocking() {
        let (handle, mut rx) = NoticeHandle::channel(1);
        handle.info("first");
        handle.info("second");

        assert_eq!(rx.recv().await, Some(Notice::Info("first".into())));
        assert!(rx.try_recv().is_err());
    }
}
