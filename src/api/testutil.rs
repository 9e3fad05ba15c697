//! In-memory `FeedService` stub shared by component tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::app::{ClipstreamError, Result};

use super::{AuthorDto, CommentDto, FeedService, MediaDto, PostDto};

#[derive(Default)]
pub(crate) struct StubService {
    pub posts: Vec<PostDto>,
    pub fail_feed: bool,
    pub fail_mutations: bool,
    /// Delay applied to like calls, to widen the in-flight window.
    pub like_delay: Option<Duration>,
    /// Whether created comments come back with an author populated.
    pub echo_comment_author: bool,
    pub liked: Mutex<HashMap<String, bool>>,
    pub calls: Mutex<Vec<String>>,
    pub next_comment_id: AtomicUsize,
}

impl StubService {
    pub fn with_posts(posts: Vec<PostDto>) -> Self {
        Self {
            posts,
            ..Default::default()
        }
    }

    /// Every remote call made, in order, as `"<op>:<id>"` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn mutation_gate(&self) -> Result<()> {
        if self.fail_mutations {
            Err(ClipstreamError::Api("request was not successful".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FeedService for StubService {
    async fn fetch_feed(&self) -> Result<Vec<PostDto>> {
        self.record("feed".into());
        if self.fail_feed {
            return Err(ClipstreamError::Api("feed fetch was not successful".into()));
        }
        Ok(self.posts.clone())
    }

    async fn toggle_like(&self, post_id: &str) -> Result<bool> {
        self.record(format!("like:{}", post_id));
        if let Some(delay) = self.like_delay {
            tokio::time::sleep(delay).await;
        }
        self.mutation_gate()?;
        let mut liked = self.liked.lock().unwrap();
        let state = liked.entry(post_id.to_string()).or_insert(false);
        *state = !*state;
        Ok(*state)
    }

    async fn share(&self, post_id: &str) -> Result<()> {
        self.record(format!("share:{}", post_id));
        self.mutation_gate()
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentDto>> {
        self.record(format!("comments:{}", post_id));
        self.mutation_gate()?;
        Ok(Vec::new())
    }

    async fn create_comment(
        &self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<CommentDto> {
        self.record(format!("comment-create:{}", post_id));
        self.mutation_gate()?;
        let id = self.next_comment_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CommentDto {
            id: format!("c{}", id),
            post_id: post_id.to_string(),
            author: self.echo_comment_author.then(|| AuthorDto {
                id: "me".into(),
                name: "Me".into(),
                avatar: None,
            }),
            content: content.to_string(),
            parent_comment_id: parent_id.map(String::from),
            created_at: Utc::now(),
            updated_at: None,
        })
    }

    async fn update_comment(&self, comment_id: &str, _content: &str) -> Result<()> {
        self.record(format!("comment-update:{}", comment_id));
        self.mutation_gate()
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        self.record(format!("comment-delete:{}", comment_id));
        self.mutation_gate()
    }
}

/// A minimal wire post of the given media kind.
pub(crate) fn post(id: &str, author_id: &str, kind: &str) -> PostDto {
    PostDto {
        id: id.into(),
        media: vec![MediaDto {
            kind: kind.into(),
            url: format!("https://cdn.example.com/{}", id),
            thumbnail: Some(format!("https://cdn.example.com/{}.thumb.jpg", id)),
        }],
        author: AuthorDto {
            id: author_id.into(),
            name: author_id.to_uppercase(),
            avatar: None,
        },
        content: String::new(),
        likes: 0,
        comments_count: 0,
        shares_count: 0,
        created_at: Utc::now(),
        location: None,
        is_liked: false,
    }
}
