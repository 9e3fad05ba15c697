pub mod comment;
pub mod item;

pub use comment::Comment;
pub use item::{Author, ContentKind, EngagementCounts, FeedItem, ItemPatch, MediaKind};
