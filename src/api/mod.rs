pub mod http;

#[cfg(test)]
pub(crate) mod testutil;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::Result;

pub use http::HttpFeedService;

/// Opaque auth capability. Token acquisition lives outside the feed
/// runtime; the runtime only ever reads the current bearer token.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> String;
}

/// A fixed token, handed in by the host (the CLI reads it from the
/// environment).
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> String {
        self.0.clone()
    }
}

/// One media attachment on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDto {
    pub id: String,
    pub media: Vec<MediaDto>,
    pub author: AuthorDto,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments_count: u64,
    #[serde(default)]
    pub shares_count: u64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "isLiked")]
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDto {
    pub id: String,
    #[serde(rename = "postId")]
    pub post_id: String,
    #[serde(default)]
    pub author: Option<AuthorDto>,
    pub content: String,
    #[serde(default, rename = "parentCommentId")]
    pub parent_comment_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Remote feed service contract: bearer-token JSON over HTTPS.
///
/// A non-success envelope and a transport error are treated identically
/// by callers, so both surface as errors here.
#[async_trait]
pub trait FeedService: Send + Sync {
    async fn fetch_feed(&self) -> Result<Vec<PostDto>>;

    /// Toggle the like state of a post. Returns the new liked state.
    async fn toggle_like(&self, post_id: &str) -> Result<bool>;

    async fn share(&self, post_id: &str) -> Result<()>;

    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentDto>>;

    async fn create_comment(
        &self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<CommentDto>;

    async fn update_comment(&self, comment_id: &str, content: &str) -> Result<()>;

    async fn delete_comment(&self, comment_id: &str) -> Result<()>;
}
