use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipstreamError {
    /// Transport-level failure talking to the feed service.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered but the envelope was not `success`.
    #[error("Service rejected request: {0}")]
    Api(String),

    #[error("Media decode error: {0}")]
    MediaDecode(#[from] image::ImageError),

    /// A video item without a poster frame cannot produce a still.
    #[error("No poster frame available for item {0}")]
    PosterUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Download already in progress for item {0}")]
    DownloadInProgress(String),

    /// User cancelled a download; terminal but not an error to surface.
    #[error("Cancelled")]
    Cancelled,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl ClipstreamError {
    /// Cancellation is a normal outcome; everything else gets surfaced
    /// to the user as a transient notice.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ClipstreamError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, ClipstreamError>;
