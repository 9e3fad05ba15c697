use std::sync::Arc;

use tokio::sync::mpsc;
use url::Url;

use crate::api::{FeedService, HttpFeedService, TokenProvider};
use crate::app::Result;
use crate::comments::CommentThreadManager;
use crate::config::Config;
use crate::download::{DownloadManager, HttpMediaSource};
use crate::engagement::{Clipboard, EngagementCoordinator};
use crate::gesture::{GestureClassifier, GestureRouter};
use crate::notify::{Notice, NoticeHandle};
use crate::playback::ViewportScheduler;
use crate::store::ContentFeedStore;

/// Wires the runtime together: remote service, feed store, engagement,
/// comments, and downloads. The host keeps the returned notice receiver
/// and drains it into its UI.
pub struct AppContext {
    pub config: Config,
    pub service: Arc<dyn FeedService>,
    pub store: Arc<ContentFeedStore>,
    pub engagement: Arc<EngagementCoordinator>,
    pub comments: CommentThreadManager,
    pub downloads: DownloadManager,
    pub notices: NoticeHandle,
}

impl AppContext {
    pub fn new(
        config: Config,
        token: Arc<dyn TokenProvider>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Result<(Self, mpsc::Receiver<Notice>)> {
        let base_url = Url::parse(&config.api.base_url)?;
        let share_base = Url::parse(&config.api.share_base_url)?;

        let service: Arc<dyn FeedService> = Arc::new(HttpFeedService::new(
            base_url,
            token,
            config.request_timeout(),
        ));
        let store = Arc::new(ContentFeedStore::new(service.clone()));
        let (notices, notice_rx) = NoticeHandle::channel(64);

        let engagement = Arc::new(EngagementCoordinator::new(
            service.clone(),
            store.clone(),
            clipboard,
            notices.clone(),
            share_base,
        ));
        let comments = CommentThreadManager::new(service.clone(), store.clone());
        let downloads = DownloadManager::new(
            store.clone(),
            Arc::new(HttpMediaSource::new()),
            notices.clone(),
            config.download_dir(),
            config.downloads.watermark_opacity,
        );

        Ok((
            Self {
                config,
                service,
                store,
                engagement,
                comments,
                downloads,
                notices,
            },
            notice_rx,
        ))
    }

    /// Scheduler for one mounted feed view. The host registers media
    /// handles on it and feeds it intersection ratios.
    pub fn viewport_scheduler(&self) -> ViewportScheduler {
        ViewportScheduler::new(self.store.clone())
    }

    /// Classifier and router pair for one mounted feed view, using the
    /// configured double-tap window. Taps go into the classifier; the
    /// router maps single taps to the scheduler's play/pause toggle and
    /// double taps to a like with the heart overlay.
    pub fn feed_view(&self) -> (GestureClassifier, GestureRouter) {
        let (events_tx, events_rx) = mpsc::channel(16);
        let classifier = GestureClassifier::with_window(events_tx, self.config.double_tap_window());
        let router = GestureRouter::new(
            self.viewport_scheduler(),
            self.engagement.clone(),
            events_rx,
        );
        (classifier, router)
    }
}
