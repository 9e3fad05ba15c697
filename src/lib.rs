//! # clipstream
//!
//! Runtime core of a short-form media feed viewer: viewport-driven
//! playback, tap-gesture disambiguation, per-item engagement, optimistic
//! comment threads, and a streaming download-and-watermark pipeline.
//!
//! ## Architecture
//!
//! ```text
//! FeedService ─→ ContentFeedStore ←─ EngagementCoordinator
//!                      ↑  ↑                  ↑
//!      ViewportScheduler  CommentThreadManager
//!            ↑                               │
//!      GestureClassifier ────────────────────┘
//!                      DownloadPipeline ─→ saved file
//! ```
//!
//! The store owns all feed state; everything else reads snapshots and
//! writes back through patches. The host UI supplies the seams: media
//! handles, intersection ratios, taps, a clipboard, and an auth token.
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`api`]: Remote service contract and reqwest client
//! - [`domain`]: Core domain models (FeedItem, Comment)
//! - [`store`]: In-memory feed state and patches
//! - [`playback`]: Viewport scheduling of media playback
//! - [`gesture`]: Single/double-tap disambiguation
//! - [`engagement`]: Like/save/share coordination
//! - [`comments`]: Optimistic-after-ack comment threads
//! - [`download`]: Streaming watermarked downloads
//! - [`notify`]: Transient user-facing notices
//! - [`config`]: TOML configuration
//! - [`cli`]: Command-line front end

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires together the remote service,
/// the feed store, and the per-item coordinators.
pub mod app;

/// Remote feed service: bearer-token JSON contract and the
/// [`FeedService`](api::FeedService) trait seam.
pub mod api;

/// Command-line interface using clap.
pub mod cli;

/// Optimistic-after-ack comment thread management.
///
/// State changes locally only after the service acknowledges, so the
/// user never sees a comment that failed to persist.
pub mod comments;

/// Configuration management.
///
/// Loads from `~/.config/clipstream/config.toml`; a commented default
/// file is written on first run.
pub mod config;

/// Core domain models.
///
/// - [`FeedItem`](domain::FeedItem): one unit of feed content
/// - [`Comment`](domain::Comment): flat-thread comment
/// - [`ItemPatch`](domain::ItemPatch): partial item update
pub mod domain;

/// Streaming download-and-watermark pipeline.
///
/// One cancellable [`DownloadManager`](download::DownloadManager) job
/// per item with monotonic progress over a watch channel.
pub mod download;

/// Per-item engagement: like (guarded against duplicate in-flight
/// requests), local save, and share with deep-link copy.
pub mod engagement;

/// Tap-gesture disambiguation with a cancellable double-tap window,
/// plus the router that maps classified taps onto playback and
/// engagement actions.
pub mod gesture;

/// Transient notices for the host UI.
pub mod notify;

/// Viewport-driven playback scheduling over host media handles.
pub mod playback;

/// In-memory feed store: ordered items, counters, active pointer.
pub mod store;
