//! In-memory feed state.
//!
//! The store owns the ordered item list and the active pointer. Every
//! mutation from the rest of the runtime goes through [`ContentFeedStore::update`]
//! so counters and flags can never drift per-component.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::api::{FeedService, PostDto};
use crate::app::Result;
use crate::domain::{Author, ContentKind, EngagementCounts, FeedItem, ItemPatch, MediaKind};

struct FeedState {
    kind: ContentKind,
    items: Vec<FeedItem>,
    active_index: usize,
}

pub struct ContentFeedStore {
    service: Arc<dyn FeedService>,
    state: RwLock<FeedState>,
}

impl ContentFeedStore {
    pub fn new(service: Arc<dyn FeedService>) -> Self {
        Self {
            service,
            state: RwLock::new(FeedState {
                kind: ContentKind::VideoFeed,
                items: Vec::new(),
                active_index: 0,
            }),
        }
    }

    /// Fetch the feed and replace the list with posts of the requested
    /// kind. The swap is all-or-nothing: a failed fetch leaves an empty
    /// list and returns the error, never a half-updated one.
    pub async fn load(&self, kind: ContentKind) -> Result<usize> {
        let posts = match self.service.fetch_feed().await {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Feed load failed: {}", e);
                let mut state = self.state.write().expect("feed state poisoned");
                state.kind = kind;
                state.items.clear();
                state.active_index = 0;
                return Err(e);
            }
        };

        let media_kind = kind.media_kind();

        // Per-author count of this kind, grouped over the full batch.
        let mut author_counts: HashMap<String, usize> = HashMap::new();
        for post in &posts {
            if post_media_kind(post) == Some(media_kind) {
                *author_counts.entry(post.author.id.clone()).or_default() += 1;
            }
        }

        let items: Vec<FeedItem> = posts
            .into_iter()
            .filter(|post| post_media_kind(post) == Some(media_kind))
            .map(|post| map_post(post, media_kind, &author_counts))
            .collect();

        debug!("Loaded {} {:?} items", items.len(), media_kind);

        let count = items.len();
        let mut state = self.state.write().expect("feed state poisoned");
        state.kind = kind;
        state.items = items;
        state.active_index = 0;
        Ok(count)
    }

    /// Apply a partial update to exactly one item. Unknown ids are a
    /// no-op; stale callbacks after a content-kind switch land here.
    pub fn update(&self, id: &str, patch: ItemPatch) {
        let mut state = self.state.write().expect("feed state poisoned");
        match state.items.iter_mut().find(|item| item.id == id) {
            Some(item) => patch.apply(item),
            None => debug!("Ignoring update for unknown item {}", id),
        }
    }

    /// The item under the active pointer, if the pointer is in range.
    pub fn active(&self) -> Option<FeedItem> {
        let state = self.state.read().expect("feed state poisoned");
        state.items.get(state.active_index).cloned()
    }

    pub fn active_index(&self) -> usize {
        self.state.read().expect("feed state poisoned").active_index
    }

    pub fn set_active(&self, index: usize) {
        self.state.write().expect("feed state poisoned").active_index = index;
    }

    /// Point the active index at the item with this id. Returns false if
    /// the id is not in the current list.
    pub fn set_active_by_id(&self, id: &str) -> bool {
        let mut state = self.state.write().expect("feed state poisoned");
        match state.items.iter().position(|item| item.id == id) {
            Some(index) => {
                state.active_index = index;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<FeedItem> {
        let state = self.state.read().expect("feed state poisoned");
        state.items.iter().find(|item| item.id == id).cloned()
    }

    pub fn items(&self) -> Vec<FeedItem> {
        self.state.read().expect("feed state poisoned").items.clone()
    }

    pub fn kind(&self) -> ContentKind {
        self.state.read().expect("feed state poisoned").kind
    }

    pub fn len(&self) -> usize {
        self.state.read().expect("feed state poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn post_media_kind(post: &PostDto) -> Option<MediaKind> {
    match post.media.first().map(|m| m.kind.as_str()) {
        Some("video") => Some(MediaKind::Video),
        Some("image") => Some(MediaKind::Image),
        _ => None,
    }
}

fn map_post(post: PostDto, kind: MediaKind, author_counts: &HashMap<String, usize>) -> FeedItem {
    let media = post.media.into_iter().next().expect("filtered on media");
    FeedItem {
        author_kind_count: author_counts.get(&post.author.id).copied().unwrap_or(0),
        id: post.id,
        media_kind: kind,
        media_url: media.url,
        thumbnail_url: media.thumbnail,
        author: Author {
            id: post.author.id,
            display_name: post.author.name,
            avatar_url: post.author.avatar,
        },
        caption: post.content,
        counts: EngagementCounts {
            likes: post.likes,
            comments: post.comments_count,
            shares: post.shares_count,
        },
        liked: post.is_liked,
        saved: false,
        downloaded: false,
        created_at: post.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testutil::{post, StubService};

    fn store_with(posts: Vec<PostDto>) -> ContentFeedStore {
        ContentFeedStore::new(Arc::new(StubService::with_posts(posts)))
    }

    #[tokio::test]
    async fn test_load_filters_by_media_kind() {
        let store = store_with(vec![
            post("v1", "u1", "video"),
            post("i1", "u1", "image"),
            post("v2", "u2", "video"),
        ]);

        let count = store.load(ContentKind::VideoFeed).await.unwrap();
        assert_eq!(count, 2);
        let ids: Vec<_> = store.items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["v1", "v2"]);

        store.load(ContentKind::ImageFeed).await.unwrap();
        let ids: Vec<_> = store.items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["i1"]);
    }

    #[tokio::test]
    async fn test_load_derives_author_kind_counts() {
        let store = store_with(vec![
            post("v1", "u1", "video"),
            post("v2", "u1", "video"),
            post("i1", "u1", "image"),
            post("v3", "u2", "video"),
        ]);

        store.load(ContentKind::VideoFeed).await.unwrap();
        let items = store.items();
        assert_eq!(items[0].author_kind_count, 2);
        assert_eq!(items[2].author_kind_count, 1);
    }

    #[tokio::test]
    async fn test_failed_load_yields_empty_list_and_error() {
        let store = store_with(vec![post("v1", "u1", "video")]);
        store.load(ContentKind::VideoFeed).await.unwrap();
        assert_eq!(store.len(), 1);

        let failing = ContentFeedStore::new(Arc::new(StubService {
            fail_feed: true,
            ..Default::default()
        }));
        assert!(failing.load(ContentKind::VideoFeed).await.is_err());
        assert!(failing.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let store = store_with(vec![post("v1", "u1", "video")]);
        store.load(ContentKind::VideoFeed).await.unwrap();

        store.update(
            "missing",
            ItemPatch {
                like_delta: 5,
                ..Default::default()
            },
        );
        assert_eq!(store.get("v1").unwrap().counts.likes, 0);
    }

    #[tokio::test]
    async fn test_active_pointer_out_of_range() {
        let store = store_with(vec![post("v1", "u1", "video")]);
        store.load(ContentKind::VideoFeed).await.unwrap();

        assert_eq!(store.active().unwrap().id, "v1");
        store.set_active(9);
        assert!(store.active().is_none());
    }

    #[tokio::test]
    async fn test_set_active_by_id() {
        let store = store_with(vec![post("v1", "u1", "video"), post("v2", "u2", "video")]);
        store.load(ContentKind::VideoFeed).await.unwrap();

        assert!(store.set_active_by_id("v2"));
        assert_eq!(store.active_index(), 1);
        assert!(!store.set_active_by_id("gone"));
    }
}
