//! Per-item engagement actions: like, save, share.
//!
//! Likes are serialized per item by an in-flight guard; a second tap on
//! a like that is still on the wire is dropped rather than queued, so a
//! burst of taps settles on the single acknowledged toggle.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use url::Url;

use crate::api::FeedService;
use crate::app::Result;
use crate::domain::ItemPatch;
use crate::notify::NoticeHandle;
use crate::store::ContentFeedStore;

/// Host clipboard seam; the share deep link lands here.
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str);
}

/// Clipboard that discards writes, for hosts without one.
pub struct NullClipboard;

impl Clipboard for NullClipboard {
    fn set_text(&self, _text: &str) {}
}

pub struct EngagementCoordinator {
    service: Arc<dyn FeedService>,
    store: Arc<ContentFeedStore>,
    clipboard: Arc<dyn Clipboard>,
    notices: NoticeHandle,
    share_base: Url,
    in_flight: Mutex<HashSet<String>>,
}

/// Clears the per-item in-flight marker on every exit path, panics
/// included.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    item_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.item_id);
    }
}

impl EngagementCoordinator {
    pub fn new(
        service: Arc<dyn FeedService>,
        store: Arc<ContentFeedStore>,
        clipboard: Arc<dyn Clipboard>,
        notices: NoticeHandle,
        share_base: Url,
    ) -> Self {
        Self {
            service,
            store,
            clipboard,
            notices,
            share_base,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Toggle the like state of an item. A like already on the wire for
    /// this item silently absorbs the call; other items are unaffected.
    pub async fn like(&self, item_id: &str) {
        let _guard = {
            let mut in_flight = self.in_flight.lock().unwrap();
            if !in_flight.insert(item_id.to_string()) {
                debug!("Like for {} already in flight, dropping", item_id);
                return;
            }
            InFlightGuard {
                set: &self.in_flight,
                item_id: item_id.to_string(),
            }
        };

        match self.service.toggle_like(item_id).await {
            Ok(liked) => {
                self.store.update(
                    item_id,
                    ItemPatch {
                        liked: Some(liked),
                        like_delta: if liked { 1 } else { -1 },
                        ..Default::default()
                    },
                );
            }
            Err(e) => {
                warn!("Like failed for {}: {}", item_id, e);
                self.notices.error(format!("Couldn't update like: {}", e));
            }
        }
    }

    /// Double-tap entry point: like plus the transient heart overlay.
    pub async fn like_with_burst(&self, item_id: &str) {
        self.notices.heart_burst(item_id);
        self.like(item_id).await;
    }

    /// Local-only bookmark toggle. The service has no save endpoint;
    /// the flag lives for the session only.
    pub fn save(&self, item_id: &str) {
        let Some(item) = self.store.get(item_id) else {
            debug!("Save on unknown item {}", item_id);
            return;
        };
        debug!("Save is client-local; not persisted for {}", item_id);
        self.store.update(
            item_id,
            ItemPatch {
                saved: Some(!item.saved),
                ..Default::default()
            },
        );
    }

    /// Share: count it on the service, then put the deep link on the
    /// host clipboard.
    pub async fn share(&self, item_id: &str) {
        match self.service.share(item_id).await {
            Ok(()) => {
                self.store.update(
                    item_id,
                    ItemPatch {
                        share_delta: 1,
                        ..Default::default()
                    },
                );
                match self.deep_link(item_id) {
                    Ok(link) => {
                        self.clipboard.set_text(link.as_str());
                        self.notices.info("Link copied to clipboard");
                    }
                    Err(e) => warn!("Could not build deep link for {}: {}", item_id, e),
                }
            }
            Err(e) => {
                warn!("Share failed for {}: {}", item_id, e);
                self.notices.error(format!("Couldn't share: {}", e));
            }
        }
    }

    pub fn deep_link(&self, item_id: &str) -> Result<Url> {
        Ok(self.share_base.join(&format!("post/{}", item_id))?)
    }
}
