//! Viewport-driven playback scheduling.
//!
//! The host UI reports intersection ratios for feed cells; the scheduler
//! decides which single item is active and drives its media handle.
//! Handles are registered per item id, never per list position, because
//! positions shift whenever the content kind is toggled.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::MediaKind;
use crate::store::ContentFeedStore;

/// An item becomes active once at least half of it is on screen.
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

/// The host refused to start playback (autoplay policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplayRejected;

/// Host-side media element. Everything except `play` is infallible from
/// the runtime's point of view; a handle that has been torn down may
/// simply ignore calls.
#[async_trait]
pub trait MediaHandle: Send + Sync {
    async fn play(&self) -> std::result::Result<(), AutoplayRejected>;
    fn pause(&self);
    fn set_muted(&self, muted: bool);
    /// Seek back to time zero.
    fn rewind(&self);
}

/// Per-item playback state. One tagged state instead of a cluster of
/// booleans, so "paused while not visible" cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Visible,
    Playing,
    Paused,
}

pub struct ViewportScheduler {
    store: Arc<ContentFeedStore>,
    handles: HashMap<String, Arc<dyn MediaHandle>>,
    states: HashMap<String, PlaybackState>,
    active: Option<String>,
}

impl ViewportScheduler {
    pub fn new(store: Arc<ContentFeedStore>) -> Self {
        Self {
            store,
            handles: HashMap::new(),
            states: HashMap::new(),
            active: None,
        }
    }

    /// Register the media handle for an item. Called when the host
    /// mounts a feed cell.
    pub fn register(&mut self, item_id: impl Into<String>, handle: Arc<dyn MediaHandle>) {
        let item_id = item_id.into();
        self.states.entry(item_id.clone()).or_default();
        self.handles.insert(item_id, handle);
    }

    /// Drop one item's handle, quiescing it first.
    pub fn deregister(&mut self, item_id: &str) {
        if let Some(handle) = self.handles.remove(item_id) {
            handle.pause();
            handle.rewind();
            handle.set_muted(true);
        }
        self.states.remove(item_id);
        if self.active.as_deref() == Some(item_id) {
            self.active = None;
        }
    }

    /// Intersection callback from the host's visibility tracking.
    pub async fn on_intersection(&mut self, item_id: &str, ratio: f32) {
        if ratio >= VISIBILITY_THRESHOLD {
            self.item_visible(item_id).await;
        } else {
            self.item_hidden(item_id);
        }
    }

    /// An item crossed into view: it becomes the single active item.
    /// The previously active item is paused before anything plays.
    ///
    /// Ratio jitter on an already-active item is a no-op, including one
    /// left `Visible` by a rejected autoplay; manual toggle is the
    /// retry path for those.
    pub async fn item_visible(&mut self, item_id: &str) {
        if self.active.as_deref() == Some(item_id) && self.state(item_id) != PlaybackState::Idle {
            return;
        }

        if let Some(previous) = self.active.take() {
            if previous != item_id {
                self.quiesce(&previous);
            }
        }

        self.active = Some(item_id.to_string());
        if !self.store.set_active_by_id(item_id) {
            debug!("Visible item {} not in current list", item_id);
        }
        self.states
            .insert(item_id.to_string(), PlaybackState::Visible);

        let Some(item) = self.store.get(item_id) else {
            return;
        };
        if item.media_kind != MediaKind::Video {
            return;
        }
        let Some(handle) = self.handles.get(item_id).cloned() else {
            warn!("No media handle registered for {}", item_id);
            return;
        };

        let state = start_playback(&handle).await;
        self.states.insert(item_id.to_string(), state);
    }

    /// An item left view: pause and mute it. Rewinding is deferred to
    /// teardown so fast re-entry does not flicker back to time zero.
    pub fn item_hidden(&mut self, item_id: &str) {
        if let Some(handle) = self.handles.get(item_id) {
            handle.pause();
            handle.set_muted(true);
        }
        self.states.insert(item_id.to_string(), PlaybackState::Idle);
        if self.active.as_deref() == Some(item_id) {
            self.active = None;
        }
    }

    /// Manual play/pause toggle for the active item only. Image items
    /// have nothing to toggle.
    pub async fn toggle_active(&mut self) {
        let Some(item_id) = self.active.clone() else {
            return;
        };
        if self.store.get(&item_id).map(|item| item.media_kind) != Some(MediaKind::Video) {
            return;
        }
        let Some(handle) = self.handles.get(&item_id).cloned() else {
            return;
        };

        match self.state(&item_id) {
            PlaybackState::Playing => {
                handle.pause();
                self.states.insert(item_id, PlaybackState::Paused);
            }
            PlaybackState::Paused | PlaybackState::Visible => {
                let state = start_playback(&handle).await;
                self.states.insert(item_id, state);
            }
            PlaybackState::Idle => {}
        }
    }

    pub fn state(&self, item_id: &str) -> PlaybackState {
        self.states.get(item_id).copied().unwrap_or_default()
    }

    pub fn active_item(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// How many items are currently playing. Invariant: never above 1.
    pub fn playing_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == PlaybackState::Playing)
            .count()
    }

    /// Quiesce every handle: pause, rewind to zero, mute.
    pub fn teardown(&mut self) {
        for handle in self.handles.values() {
            handle.pause();
            handle.rewind();
            handle.set_muted(true);
        }
        for state in self.states.values_mut() {
            *state = PlaybackState::Idle;
        }
        self.active = None;
    }

    fn quiesce(&mut self, item_id: &str) {
        if let Some(handle) = self.handles.get(item_id) {
            handle.pause();
            handle.set_muted(true);
        }
        self.states.insert(item_id.to_string(), PlaybackState::Idle);
    }
}

/// Try to play unmuted; on autoplay rejection retry muted exactly once.
async fn start_playback(handle: &Arc<dyn MediaHandle>) -> PlaybackState {
    handle.set_muted(false);
    match handle.play().await {
        Ok(()) => PlaybackState::Playing,
        Err(AutoplayRejected) => {
            debug!("Unmuted autoplay rejected, retrying muted");
            handle.set_muted(true);
            match handle.play().await {
                Ok(()) => PlaybackState::Playing,
                Err(AutoplayRejected) => {
                    warn!("Muted playback rejected too; leaving item visible");
                    PlaybackState::Visible
                }
            }
        }
    }
}
