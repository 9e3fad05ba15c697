use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Author;

/// A comment in a flat per-item thread.
///
/// `parent_id` does not nest comments; replies are rendered flat with an
/// `@author` mention prefixed to the content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub item_id: String,
    pub author: Author,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub parent_id: Option<String>,
    /// Local-only like toggle; never sent to the service.
    pub liked: bool,
}

impl Comment {
    pub fn is_edited(&self) -> bool {
        self.updated_at.is_some()
    }
}
