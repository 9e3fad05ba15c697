use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::app::{ClipstreamError, Result};

use super::{CommentDto, FeedService, PostDto, TokenProvider};

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
}

#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    success: bool,
    #[serde(default)]
    posts: Vec<PostDto>,
}

#[derive(Debug, Deserialize)]
struct LikeEnvelope {
    success: bool,
    liked: bool,
}

#[derive(Debug, Deserialize)]
struct CommentsEnvelope {
    success: bool,
    #[serde(default)]
    comments: Vec<CommentDto>,
}

#[derive(Debug, Deserialize)]
struct CommentEnvelope {
    success: bool,
    comment: Option<CommentDto>,
}

/// Bearer-token JSON client for the feed service.
pub struct HttpFeedService {
    client: Client,
    base_url: Url,
    token: Arc<dyn TokenProvider>,
}

impl HttpFeedService {
    pub fn new(base_url: Url, token: Arc<dyn TokenProvider>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("clipstream/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            token,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .bearer_auth(self.token.token())
            .send()
            .await?;
        response.error_for_status_ref()?;
        Ok(response.json().await?)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .request(method, self.endpoint(path)?)
            .bearer_auth(self.token.token())
            .json(body)
            .send()
            .await?;
        response.error_for_status_ref()?;
        Ok(response.json().await?)
    }
}

fn require_success(success: bool, what: &str) -> Result<()> {
    if success {
        Ok(())
    } else {
        Err(ClipstreamError::Api(format!("{} was not successful", what)))
    }
}

#[async_trait]
impl FeedService for HttpFeedService {
    async fn fetch_feed(&self) -> Result<Vec<PostDto>> {
        let envelope: FeedEnvelope = self.get("feed").await?;
        require_success(envelope.success, "feed fetch")?;
        Ok(envelope.posts)
    }

    async fn toggle_like(&self, post_id: &str) -> Result<bool> {
        let envelope: LikeEnvelope = self
            .send_json(reqwest::Method::POST, "like", &json!({ "postId": post_id }))
            .await?;
        require_success(envelope.success, "like toggle")?;
        Ok(envelope.liked)
    }

    async fn share(&self, post_id: &str) -> Result<()> {
        let envelope: Envelope = self
            .send_json(
                reqwest::Method::POST,
                "share",
                &json!({ "postId": post_id }),
            )
            .await?;
        require_success(envelope.success, "share")
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentDto>> {
        let envelope: CommentsEnvelope = self.get(&format!("comments/{}", post_id)).await?;
        require_success(envelope.success, "comment list")?;
        Ok(envelope.comments)
    }

    async fn create_comment(
        &self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<CommentDto> {
        let mut body = json!({ "postId": post_id, "content": content });
        if let Some(parent_id) = parent_id {
            body["parentCommentId"] = json!(parent_id);
        }
        let envelope: CommentEnvelope = self
            .send_json(reqwest::Method::POST, "comment", &body)
            .await?;
        require_success(envelope.success, "comment create")?;
        envelope
            .comment
            .ok_or_else(|| ClipstreamError::Api("comment create returned no comment".into()))
    }

    async fn update_comment(&self, comment_id: &str, content: &str) -> Result<()> {
        let envelope: Envelope = self
            .send_json(
                reqwest::Method::PUT,
                &format!("comment/{}", comment_id),
                &json!({ "content": content }),
            )
            .await?;
        require_success(envelope.success, "comment update")
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("comment/{}", comment_id))?)
            .bearer_auth(self.token.token())
            .send()
            .await?;
        response.error_for_status_ref()?;
        let envelope: Envelope = response.json().await?;
        require_success(envelope.success, "comment delete")
    }
}
