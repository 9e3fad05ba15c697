pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::ContentKind;

#[derive(Parser)]
#[command(name = "clipstream")]
#[command(about = "Short-form media feed client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FeedKind {
    Video,
    Image,
}

impl From<FeedKind> for ContentKind {
    fn from(kind: FeedKind) -> Self {
        match kind {
            FeedKind::Video => ContentKind::VideoFeed,
            FeedKind::Image => ContentKind::ImageFeed,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the feed
    Feed {
        /// Which feed to load
        #[arg(short, long, value_enum, default_value_t = FeedKind::Video)]
        kind: FeedKind,
    },
    /// Toggle like on an item
    Like {
        /// Item id
        id: String,
    },
    /// Toggle the local bookmark on an item
    Save {
        /// Item id
        id: String,
    },
    /// Share an item and print its deep link
    Share {
        /// Item id
        id: String,
    },
    /// List an item's comments
    Comments {
        /// Item id
        id: String,
    },
    /// Post a comment on an item
    Comment {
        /// Item id
        id: String,
        /// Comment text
        text: String,
        /// Comment id to reply to (flat @mention, not nesting)
        #[arg(long)]
        reply_to: Option<String>,
    },
    /// Download an item's media with the brand watermark
    Download {
        /// Item id
        id: String,
        /// Save directory (overrides the configured one)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}
