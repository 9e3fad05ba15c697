use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which feed the viewer is showing. Toggling this re-loads the list,
/// so item positions are never stable across a switch; ids are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    VideoFeed,
    ImageFeed,
}

impl ContentKind {
    pub fn media_kind(self) -> MediaKind {
        match self {
            ContentKind::VideoFeed => MediaKind::Video,
            ContentKind::ImageFeed => MediaKind::Image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Label used in saved-file names.
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }

    /// Extension of the saved file. The video case is labelled `.mp4`
    /// even though the pipeline only ever exports a single still frame;
    /// existing users expect that name.
    pub fn file_extension(self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Image => "jpg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

/// One unit of feed content. Owned exclusively by the store; everything
/// else sees clones and mutates through [`ItemPatch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub media_kind: MediaKind,
    pub media_url: String,
    pub thumbnail_url: Option<String>,
    pub author: Author,
    pub caption: String,
    pub counts: EngagementCounts,
    pub liked: bool,
    pub saved: bool,
    pub downloaded: bool,
    pub created_at: DateTime<Utc>,
    /// How many posts of the loaded kind this author has in the current
    /// batch. Derived at load time, not part of the wire contract.
    pub author_kind_count: usize,
}

impl FeedItem {
    pub fn display_author(&self) -> &str {
        &self.author.display_name
    }
}

/// Partial update applied to exactly one item. Counter deltas saturate
/// at zero; counters never go negative.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemPatch {
    pub liked: Option<bool>,
    pub saved: Option<bool>,
    pub downloaded: Option<bool>,
    pub like_delta: i64,
    pub comment_delta: i64,
    pub share_delta: i64,
}

impl ItemPatch {
    pub fn apply(&self, item: &mut FeedItem) {
        if let Some(liked) = self.liked {
            item.liked = liked;
        }
        if let Some(saved) = self.saved {
            item.saved = saved;
        }
        if let Some(downloaded) = self.downloaded {
            item.downloaded = downloaded;
        }
        item.counts.likes = apply_delta(item.counts.likes, self.like_delta);
        item.counts.comments = apply_delta(item.counts.comments, self.comment_delta);
        item.counts.shares = apply_delta(item.counts.shares, self.share_delta);
    }
}

fn apply_delta(count: u64, delta: i64) -> u64 {
    if delta >= 0 {
        count.saturating_add(delta as u64)
    } else {
        count.saturating_sub(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> FeedItem {
        FeedItem {
            id: "post-1".into(),
            media_kind: MediaKind::Video,
            media_url: "https://cdn.example.com/v/1.mp4".into(),
            thumbnail_url: None,
            author: Author {
                id: "u1".into(),
                display_name: "Ada".into(),
                avatar_url: None,
            },
            caption: "first".into(),
            counts: EngagementCounts::default(),
            liked: false,
            saved: false,
            downloaded: false,
            created_at: Utc::now(),
            author_kind_count: 1,
        }
    }

    #[test]
    fn test_patch_flips_booleans() {
        let mut it = item();
        ItemPatch {
            liked: Some(true),
            saved: Some(true),
            ..Default::default()
        }
        .apply(&mut it);
        assert!(it.liked);
        assert!(it.saved);
        assert!(!it.downloaded);
    }

    #[test]
    fn test_patch_counter_deltas() {
        let mut it = item();
        ItemPatch {
            like_delta: 2,
            comment_delta: 1,
            ..Default::default()
        }
        .apply(&mut it);
        assert_eq!(it.counts.likes, 2);
        assert_eq!(it.counts.comments, 1);
    }

    #[test]
    fn test_counters_floor_at_zero() {
        let mut it = item();
        it.counts.comments = 1;
        ItemPatch {
            comment_delta: -3,
            like_delta: -1,
            ..Default::default()
        }
        .apply(&mut it);
        assert_eq!(it.counts.comments, 0);
        assert_eq!(it.counts.likes, 0);
    }

    #[test]
    fn test_video_download_filename_parts() {
        assert_eq!(MediaKind::Video.label(), "video");
        assert_eq!(MediaKind::Video.file_extension(), "mp4");
        assert_eq!(MediaKind::Image.file_extension(), "jpg");
    }
}
