//! Streaming download-and-watermark pipeline.
//!
//! One cancellable job per item: stream the remote media with progress,
//! decode a frame, composite the brand watermark, and save a JPEG. The
//! "video" path exports a single still frame (the item's poster) under a
//! `.mp4` name — a limitation of the original client that is reproduced
//! here because users rely on the exact output naming.

pub mod watermark;

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use image::{DynamicImage, ImageFormat};
use reqwest::Client;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::{ClipstreamError, Result};
use crate::domain::{FeedItem, ItemPatch, MediaKind};
use crate::notify::NoticeHandle;
use crate::store::ContentFeedStore;

/// Progress after job validation, before the first byte arrives.
const SETUP_PROGRESS: u8 = 10;
/// The streamed fetch maps linearly onto this sub-range.
const FETCH_START: u8 = 20;
const FETCH_END: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Fetching,
    Compositing,
    Complete,
    Failed,
    Cancelled,
}

impl DownloadPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DownloadPhase::Complete | DownloadPhase::Failed | DownloadPhase::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub phase: DownloadPhase,
    pub percent: u8,
}

/// An opened media resource: optional total length plus a byte stream.
pub struct MediaStream {
    pub content_length: Option<u64>,
    pub bytes: BoxStream<'static, Result<Bytes>>,
}

/// Seam for fetching raw media bytes, separate from the JSON service so
/// CDN reads stay unauthenticated and streamable.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn open(&self, url: &str) -> Result<MediaStream>;
}

pub struct HttpMediaSource {
    client: Client,
}

impl HttpMediaSource {
    pub fn new() -> Self {
        // No total timeout; large media downloads are bounded by the
        // connect timeout and user cancellation instead.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("clipstream/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    async fn open(&self, url: &str) -> Result<MediaStream> {
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;
        let content_length = response.content_length();
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClipstreamError::from))
            .boxed();
        Ok(MediaStream {
            content_length,
            bytes,
        })
    }
}

/// Monotonic progress publisher. `set` never moves percent backwards,
/// so out-of-order reporting cannot violate the progress invariant.
struct ProgressReporter {
    tx: watch::Sender<DownloadProgress>,
    current: DownloadProgress,
}

impl ProgressReporter {
    fn new(tx: watch::Sender<DownloadProgress>) -> Self {
        let current = *tx.borrow();
        Self { tx, current }
    }

    fn set(&mut self, phase: DownloadPhase, percent: u8) {
        let percent = percent.max(self.current.percent);
        self.current = DownloadProgress { phase, percent };
        let _ = self.tx.send(self.current);
    }

    fn finish(&mut self, phase: DownloadPhase) {
        let percent = if phase == DownloadPhase::Complete {
            100
        } else {
            self.current.percent
        };
        self.current = DownloadProgress { phase, percent };
        let _ = self.tx.send(self.current);
    }

    fn percent(&self) -> u8 {
        self.current.percent
    }
}

/// Handle to a started job: watch its progress, cancel it, await it.
pub struct DownloadTicket {
    pub item_id: String,
    progress: watch::Receiver<DownloadProgress>,
    cancel: CancellationToken,
}

impl DownloadTicket {
    pub fn progress(&self) -> watch::Receiver<DownloadProgress> {
        self.progress.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the job to reach a terminal phase.
    pub async fn wait(mut self) -> DownloadProgress {
        loop {
            let current = *self.progress.borrow();
            if current.phase.is_terminal() {
                return current;
            }
            if self.progress.changed().await.is_err() {
                return *self.progress.borrow();
            }
        }
    }
}

pub enum DownloadStart {
    Started(DownloadTicket),
    /// The item is already marked downloaded; nothing to do.
    AlreadyDownloaded,
}

struct ActiveJob {
    cancel: CancellationToken,
    progress: watch::Receiver<DownloadProgress>,
}

/// Owns the one-job-per-item table. Cheap to clone; all clones share
/// the same job table.
#[derive(Clone)]
pub struct DownloadManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<ContentFeedStore>,
    source: Arc<dyn MediaSource>,
    notices: NoticeHandle,
    save_dir: PathBuf,
    watermark_opacity: f32,
    jobs: Mutex<HashMap<String, ActiveJob>>,
}

impl DownloadManager {
    pub fn new(
        store: Arc<ContentFeedStore>,
        source: Arc<dyn MediaSource>,
        notices: NoticeHandle,
        save_dir: PathBuf,
        watermark_opacity: f32,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                source,
                notices,
                save_dir,
                watermark_opacity,
                jobs: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start a download job for an item. At most one job per item; an
    /// already-downloaded item is a no-op.
    pub fn start(&self, item_id: &str) -> Result<DownloadStart> {
        self.start_into(item_id, None)
    }

    /// Like [`start`](Self::start), with an optional per-call save
    /// directory overriding the configured one.
    pub fn start_into(&self, item_id: &str, out_dir: Option<PathBuf>) -> Result<DownloadStart> {
        let item = self
            .inner
            .store
            .get(item_id)
            .ok_or_else(|| ClipstreamError::ItemNotFound(item_id.to_string()))?;
        if item.downloaded {
            debug!("Item {} already downloaded", item_id);
            return Ok(DownloadStart::AlreadyDownloaded);
        }

        let mut jobs = self.inner.jobs.lock().unwrap();
        if jobs.contains_key(item_id) {
            return Err(ClipstreamError::DownloadInProgress(item_id.to_string()));
        }

        let (tx, rx) = watch::channel(DownloadProgress {
            phase: DownloadPhase::Fetching,
            percent: 0,
        });
        let cancel = CancellationToken::new();
        jobs.insert(
            item_id.to_string(),
            ActiveJob {
                cancel: cancel.clone(),
                progress: rx.clone(),
            },
        );
        drop(jobs);

        let inner = self.inner.clone();
        let job_cancel = cancel.clone();
        let save_dir = out_dir.unwrap_or_else(|| self.inner.save_dir.clone());
        tokio::spawn(async move {
            inner.run_job(item, save_dir, tx, job_cancel).await;
        });

        Ok(DownloadStart::Started(DownloadTicket {
            item_id: item_id.to_string(),
            progress: rx,
            cancel,
        }))
    }

    /// Cancel the active job for an item, if any.
    pub fn cancel(&self, item_id: &str) -> bool {
        let jobs = self.inner.jobs.lock().unwrap();
        match jobs.get(item_id) {
            Some(job) => {
                job.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Progress receiver for an item's active job.
    pub fn active_job(&self, item_id: &str) -> Option<watch::Receiver<DownloadProgress>> {
        self.inner
            .jobs
            .lock()
            .unwrap()
            .get(item_id)
            .map(|job| job.progress.clone())
    }
}

/// Removes the job-table entry on every exit path, panics included, so
/// a crashed job never blocks later downloads of the same item.
struct JobGuard<'a> {
    jobs: &'a Mutex<HashMap<String, ActiveJob>>,
    item_id: &'a str,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.jobs.lock().unwrap().remove(self.item_id);
    }
}

impl Inner {
    async fn run_job(
        self: Arc<Self>,
        item: FeedItem,
        save_dir: PathBuf,
        tx: watch::Sender<DownloadProgress>,
        cancel: CancellationToken,
    ) {
        let _guard = JobGuard {
            jobs: &self.jobs,
            item_id: &item.id,
        };
        let mut reporter = ProgressReporter::new(tx);
        let result = self.execute(&item, &save_dir, &mut reporter, &cancel).await;

        match result {
            Ok(path) => {
                reporter.finish(DownloadPhase::Complete);
                self.store.update(
                    &item.id,
                    ItemPatch {
                        downloaded: Some(true),
                        ..Default::default()
                    },
                );
                info!("Saved {} to {}", item.id, path.display());
                self.notices
                    .info(format!("Saved to {}", path.display()));
            }
            Err(e) if e.is_cancellation() => {
                // User-initiated; terminal but silent.
                reporter.finish(DownloadPhase::Cancelled);
                debug!("Download of {} cancelled", item.id);
            }
            Err(e) => {
                reporter.finish(DownloadPhase::Failed);
                warn!("Download of {} failed: {}", item.id, e);
                self.notices.error(format!("Download failed: {}", e));
            }
        }
    }

    async fn execute(
        &self,
        item: &FeedItem,
        save_dir: &Path,
        reporter: &mut ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        reporter.set(DownloadPhase::Fetching, SETUP_PROGRESS);

        let media = self.fetch_with_progress(&item.media_url, reporter, cancel).await?;
        if cancel.is_cancelled() {
            return Err(ClipstreamError::Cancelled);
        }

        let frame = match item.media_kind {
            MediaKind::Image => image::load_from_memory(&media)?,
            MediaKind::Video => {
                // Single-frame limitation: the poster stands in for the
                // first video frame. The streamed media bytes are only
                // used for byte-accurate progress and are dropped here.
                let poster_url = item
                    .thumbnail_url
                    .clone()
                    .ok_or_else(|| ClipstreamError::PosterUnavailable(item.id.clone()))?;
                drop(media);
                let poster = self.fetch_quiet(&poster_url, cancel).await?;
                image::load_from_memory(&poster)?
            }
        };
        if cancel.is_cancelled() {
            return Err(ClipstreamError::Cancelled);
        }

        reporter.set(DownloadPhase::Compositing, FETCH_END);
        let mut canvas = frame.to_rgba8();
        watermark::composite(&mut canvas, self.watermark_opacity);

        // JPEG-class output regardless of kind; the video case simply
        // carries a video-looking filename.
        let mut encoded = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .to_rgb8()
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)?;

        let filename = format!(
            "clipstream_{}_{}.{}",
            item.media_kind.label(),
            item.id,
            item.media_kind.file_extension()
        );
        tokio::fs::create_dir_all(save_dir).await?;
        let path = save_dir.join(filename);
        tokio::fs::write(&path, &encoded).await?;
        Ok(path)
    }

    /// Stream a resource, mapping received bytes onto the 20–90 progress
    /// window when the total is known. Cancellation is polled at every
    /// chunk boundary; an abort drops the partial buffer.
    async fn fetch_with_progress(
        &self,
        url: &str,
        reporter: &mut ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let mut stream = self.source.open(url).await?;
        let total = stream.content_length;
        let mut received = Vec::new();

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClipstreamError::Cancelled),
                chunk = stream.bytes.next() => chunk,
            };
            let Some(chunk) = chunk else {
                break;
            };
            received.extend_from_slice(&chunk?);
            let percent = fetch_percent(received.len() as u64, total, reporter.percent());
            reporter.set(DownloadPhase::Fetching, percent);
        }

        Ok(received)
    }

    /// Collect a small resource (the poster frame) without progress.
    async fn fetch_quiet(&self, url: &str, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let mut stream = self.source.open(url).await?;
        let mut received = Vec::new();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClipstreamError::Cancelled),
                chunk = stream.bytes.next() => chunk,
            };
            let Some(chunk) = chunk else {
                break;
            };
            received.extend_from_slice(&chunk?);
        }
        Ok(received)
    }
}

/// Map received bytes onto the fetch progress window.
///
/// Known totals interpolate linearly over 20–90; unknown totals creep
/// one point per chunk and hold at 89 until the stream ends.
fn fetch_percent(received: u64, total: Option<u64>, previous: u8) -> u8 {
    match total {
        Some(total) if total > 0 => {
            let span = (FETCH_END - FETCH_START) as u64;
            let scaled = FETCH_START as u64 + (received.min(total) * span) / total;
            scaled as u8
        }
        _ => previous.saturating_add(1).clamp(FETCH_START, FETCH_END - 1),
    }
}
