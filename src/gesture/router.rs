//! Binds classified gestures to their actions.
//!
//! A single tap toggles play/pause on the item only if it is the active
//! one; a double tap likes the tapped item and fires the heart overlay.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engagement::EngagementCoordinator;
use crate::playback::ViewportScheduler;

use super::GestureEvent;

/// Consumes [`GestureEvent`]s from a classifier and drives the playback
/// scheduler and engagement coordinator for one mounted feed view.
pub struct GestureRouter {
    scheduler: ViewportScheduler,
    engagement: Arc<EngagementCoordinator>,
    events: mpsc::Receiver<GestureEvent>,
}

impl GestureRouter {
    pub fn new(
        scheduler: ViewportScheduler,
        engagement: Arc<EngagementCoordinator>,
        events: mpsc::Receiver<GestureEvent>,
    ) -> Self {
        Self {
            scheduler,
            engagement,
            events,
        }
    }

    /// The view's scheduler, for handle registration and intersection
    /// callbacks.
    pub fn scheduler_mut(&mut self) -> &mut ViewportScheduler {
        &mut self.scheduler
    }

    pub fn scheduler(&self) -> &ViewportScheduler {
        &self.scheduler
    }

    /// Drain events until the classifier side closes the channel.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            self.dispatch(event).await;
        }
    }

    /// Dispatch everything already queued, without waiting for more.
    pub async fn drain_pending(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event).await;
        }
    }

    /// Apply one gesture. Single taps on items that are no longer active
    /// are dropped; the viewport moved on before the window elapsed.
    pub async fn dispatch(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::SingleTap { item_id } => {
                if self.scheduler.active_item() == Some(item_id.as_str()) {
                    self.scheduler.toggle_active().await;
                }
            }
            GestureEvent::DoubleTap { item_id } => {
                self.engagement.like_with_burst(&item_id).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testutil::{post, StubService};
    use crate::domain::ContentKind;
    use crate::gesture::GestureClassifier;
    use crate::notify::{Notice, NoticeHandle};
    use crate::playback::{AutoplayRejected, MediaHandle, PlaybackState};
    use crate::store::ContentFeedStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc::Receiver;
    use url::Url;

    #[derive(Default)]
    struct CountingHandle {
        plays: AtomicUsize,
        pauses: AtomicUsize,
    }

    #[async_trait]
    impl MediaHandle for CountingHandle {
        async fn play(&self) -> std::result::Result<(), AutoplayRejected> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }

        fn set_muted(&self, _muted: bool) {}

        fn rewind(&self) {}
    }

    async fn view() -> (
        GestureClassifier,
        GestureRouter,
        Arc<StubService>,
        Arc<CountingHandle>,
        Receiver<Notice>,
    ) {
        let service = Arc::new(StubService::with_posts(vec![post("v1", "u1", "video")]));
        let store = Arc::new(ContentFeedStore::new(service.clone()));
        store.load(ContentKind::VideoFeed).await.unwrap();

        let (notices, notice_rx) = NoticeHandle::channel(8);
        let engagement = Arc::new(EngagementCoordinator::new(
            service.clone(),
            store.clone(),
            Arc::new(crate::engagement::NullClipboard),
            notices,
            Url::parse("https://clipstream.app/").unwrap(),
        ));

        let mut scheduler = ViewportScheduler::new(store);
        let handle = Arc::new(CountingHandle::default());
        scheduler.register("v1", handle.clone());
        scheduler.item_visible("v1").await;

        let (tx, rx) = mpsc::channel(8);
        let classifier = GestureClassifier::new(tx);
        let router = GestureRouter::new(scheduler, engagement, rx);
        (classifier, router, service, handle, notice_rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_tap_likes_once_without_playback_toggle() {
        let (mut classifier, mut router, service, handle, mut notices) = view().await;
        let plays_after_activation = handle.plays.load(Ordering::SeqCst);

        classifier.tap("v1");
        tokio::time::advance(Duration::from_millis(100)).await;
        classifier.tap("v1");
        tokio::time::advance(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;
        router.drain_pending().await;

        let like_calls = service
            .calls()
            .iter()
            .filter(|c| c.starts_with("like:"))
            .count();
        assert_eq!(like_calls, 1);
        // Exactly one like toggle, zero play/pause toggles.
        assert_eq!(handle.plays.load(Ordering::SeqCst), plays_after_activation);
        assert_eq!(handle.pauses.load(Ordering::SeqCst), 0);
        assert_eq!(
            notices.try_recv().unwrap(),
            Notice::HeartBurst {
                item_id: "v1".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_tap_pauses_active_item() {
        let (mut classifier, mut router, service, handle, _notices) = view().await;

        classifier.tap("v1");
        tokio::time::advance(Duration::from_millis(301)).await;
        tokio::task::yield_now().await;
        router.drain_pending().await;

        assert_eq!(handle.pauses.load(Ordering::SeqCst), 1);
        assert_eq!(router.scheduler().state("v1"), PlaybackState::Paused);
        assert!(!service.calls().iter().any(|c| c.starts_with("like:")));
    }

    #[tokio::test]
    async fn test_single_tap_on_inactive_item_is_dropped() {
        let (_classifier, mut router, _service, handle, _notices) = view().await;

        router
            .dispatch(GestureEvent::SingleTap {
                item_id: "gone".into(),
            })
            .await;

        assert_eq!(handle.pauses.load(Ordering::SeqCst), 0);
        assert_eq!(router.scheduler().state("v1"), PlaybackState::Playing);
    }
}
