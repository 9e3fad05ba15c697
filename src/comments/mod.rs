//! Comment thread for the currently open item.
//!
//! All remote mutations are optimistic-after-ack: dispatch the intent,
//! await the service, and only then touch local state. Nothing the user
//! sees can fail to persist afterwards.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::api::{CommentDto, FeedService};
use crate::app::{ClipstreamError, Result};
use crate::domain::{Author, Comment, ItemPatch};
use crate::store::ContentFeedStore;

struct Thread {
    item_id: String,
    comments: Vec<Comment>,
}

pub struct CommentThreadManager {
    service: Arc<dyn FeedService>,
    store: Arc<ContentFeedStore>,
    thread: Option<Thread>,
}

impl CommentThreadManager {
    pub fn new(service: Arc<dyn FeedService>, store: Arc<ContentFeedStore>) -> Self {
        Self {
            service,
            store,
            thread: None,
        }
    }

    /// Load the flat comment list for an item and make it the open
    /// thread.
    pub async fn open(&mut self, item_id: &str) -> Result<&[Comment]> {
        let item = self
            .store
            .get(item_id)
            .ok_or_else(|| ClipstreamError::ItemNotFound(item_id.to_string()))?;

        let dtos = self.service.list_comments(item_id).await?;
        let comments = dtos
            .into_iter()
            .map(|dto| map_comment(dto, &item.author))
            .collect();

        self.thread = Some(Thread {
            item_id: item_id.to_string(),
            comments,
        });
        Ok(self.comments())
    }

    pub fn close(&mut self) {
        self.thread = None;
    }

    pub fn open_item(&self) -> Option<&str> {
        self.thread.as_ref().map(|t| t.item_id.as_str())
    }

    pub fn comments(&self) -> &[Comment] {
        self.thread.as_ref().map(|t| t.comments.as_slice()).unwrap_or(&[])
    }

    /// Post a comment to the open thread. Replies stay flat: a
    /// `parent_id` only prefixes the text with an `@author` mention.
    /// The comment appears locally (prepended) and the item counter
    /// moves only after the service acknowledges.
    pub async fn create(&mut self, text: &str, parent_id: Option<&str>) -> Result<&Comment> {
        let thread = self
            .thread
            .as_ref()
            .ok_or_else(|| ClipstreamError::Other("no open comment thread".into()))?;
        let item_id = thread.item_id.clone();

        let content = match parent_id {
            Some(parent) => {
                let parent_author = thread
                    .comments
                    .iter()
                    .find(|c| c.id == parent)
                    .ok_or_else(|| ClipstreamError::CommentNotFound(parent.to_string()))?
                    .author
                    .display_name
                    .clone();
                format!("@{} {}", parent_author, text)
            }
            None => text.to_string(),
        };

        let dto = self
            .service
            .create_comment(&item_id, &content, parent_id)
            .await?;

        // The service does not always echo the author back; fall back to
        // the viewed item's cached author, as the original client did.
        let fallback = self
            .store
            .get(&item_id)
            .map(|item| item.author)
            .ok_or_else(|| ClipstreamError::ItemNotFound(item_id.clone()))?;
        let comment = map_comment(dto, &fallback);

        let thread = self.thread.as_mut().expect("thread checked above");
        thread.comments.insert(0, comment);
        self.store.update(
            &item_id,
            ItemPatch {
                comment_delta: 1,
                ..Default::default()
            },
        );
        Ok(&thread.comments[0])
    }

    /// Edit a comment's content; local state changes only on ack.
    pub async fn update(&mut self, comment_id: &str, text: &str) -> Result<()> {
        let thread = self
            .thread
            .as_mut()
            .ok_or_else(|| ClipstreamError::Other("no open comment thread".into()))?;
        if !thread.comments.iter().any(|c| c.id == comment_id) {
            return Err(ClipstreamError::CommentNotFound(comment_id.to_string()));
        }

        self.service.update_comment(comment_id, text).await?;

        let thread = self.thread.as_mut().expect("thread checked above");
        if let Some(comment) = thread.comments.iter_mut().find(|c| c.id == comment_id) {
            comment.content = text.to_string();
            comment.updated_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Delete a comment; on ack it leaves the list and the item counter
    /// steps down (floored at zero by the store).
    pub async fn remove(&mut self, comment_id: &str) -> Result<()> {
        let thread = self
            .thread
            .as_ref()
            .ok_or_else(|| ClipstreamError::Other("no open comment thread".into()))?;
        if !thread.comments.iter().any(|c| c.id == comment_id) {
            return Err(ClipstreamError::CommentNotFound(comment_id.to_string()));
        }
        let item_id = thread.item_id.clone();

        self.service.delete_comment(comment_id).await?;

        let thread = self.thread.as_mut().expect("thread checked above");
        thread.comments.retain(|c| c.id != comment_id);
        self.store.update(
            &item_id,
            ItemPatch {
                comment_delta: -1,
                ..Default::default()
            },
        );
        Ok(())
    }

    /// Local-only like toggle on a comment. Never sent to the service;
    /// the state lives only as long as the thread stays open.
    pub fn toggle_like(&mut self, comment_id: &str) {
        let Some(thread) = self.thread.as_mut() else {
            return;
        };
        match thread.comments.iter_mut().find(|c| c.id == comment_id) {
            Some(comment) => comment.liked = !comment.liked,
            None => debug!("Like toggle on unknown comment {}", comment_id),
        }
    }
}

fn map_comment(dto: CommentDto, fallback_author: &Author) -> Comment {
    let author = match dto.author {
        Some(author) => Author {
            id: author.id,
            display_name: author.name,
            avatar_url: author.avatar,
        },
        None => fallback_author.clone(),
    };
    Comment {
        id: dto.id,
        item_id: dto.post_id,
        author,
        content: dto.content,
        created_at: dto.created_at,
        updated_at: dto.updated_at,
        parent_id: dto.parent_comment_id,
        liked: false,
    }
}
