use std::path::PathBuf;

use crate::app::{AppContext, ClipstreamError, Result};
use crate::domain::ContentKind;
use crate::download::DownloadStart;

pub async fn show_feed(ctx: &AppContext, kind: ContentKind) -> Result<()> {
    let count = ctx.store.load(kind).await?;
    println!("{} items", count);

    for item in ctx.store.items() {
        let flags = format!(
            "{}{}{}",
            if item.liked { "♥" } else { " " },
            if item.saved { "☆" } else { " " },
            if item.downloaded { "↓" } else { " " },
        );
        println!(
            "{:12} [{}] {} ({} posts)  likes:{} comments:{} shares:{}",
            item.id,
            flags,
            item.display_author(),
            item.author_kind_count,
            item.counts.likes,
            item.counts.comments,
            item.counts.shares,
        );
        if !item.caption.is_empty() {
            println!("             {}", truncate(&item.caption, 72));
        }
    }
    Ok(())
}

pub async fn like(ctx: &AppContext, id: &str) -> Result<()> {
    ensure_item(ctx, id).await?;
    ctx.engagement.like(id).await;
    let item = item(ctx, id)?;
    println!(
        "{}: liked={} likes={}",
        id, item.liked, item.counts.likes
    );
    Ok(())
}

pub async fn save(ctx: &AppContext, id: &str) -> Result<()> {
    ensure_item(ctx, id).await?;
    ctx.engagement.save(id);
    println!("{}: saved={}", id, item(ctx, id)?.saved);
    Ok(())
}

pub async fn share(ctx: &AppContext, id: &str) -> Result<()> {
    ensure_item(ctx, id).await?;
    ctx.engagement.share(id).await;
    println!("{}", ctx.engagement.deep_link(id)?);
    Ok(())
}

pub async fn list_comments(ctx: &mut AppContext, id: &str) -> Result<()> {
    ensure_item(ctx, id).await?;
    let comments = ctx.comments.open(id).await?;
    if comments.is_empty() {
        println!("No comments");
    }
    for comment in comments {
        let edited = if comment.is_edited() { " (edited)" } else { "" };
        println!(
            "{:10} {}{}: {}",
            comment.id, comment.author.display_name, edited, comment.content
        );
    }
    Ok(())
}

pub async fn post_comment(
    ctx: &mut AppContext,
    id: &str,
    text: &str,
    reply_to: Option<&str>,
) -> Result<()> {
    ensure_item(ctx, id).await?;
    ctx.comments.open(id).await?;
    let comment = ctx.comments.create(text, reply_to).await?;
    println!("Posted {}: {}", comment.id, comment.content);
    Ok(())
}

pub async fn download(ctx: &AppContext, id: &str, out: Option<PathBuf>) -> Result<()> {
    ensure_item(ctx, id).await?;

    let ticket = match ctx.downloads.start_into(id, out)? {
        DownloadStart::Started(ticket) => ticket,
        DownloadStart::AlreadyDownloaded => {
            println!("Already downloaded");
            return Ok(());
        }
    };

    let mut progress = ticket.progress();
    loop {
        tokio::select! {
            changed = progress.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *progress.borrow();
                print!("\r{:?} {:3}%   ", current.phase, current.percent);
                use std::io::Write;
                let _ = std::io::stdout().flush();
                if current.phase.is_terminal() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                ticket.cancel();
            }
        }
    }
    println!();
    Ok(())
}

/// Commands address items by id without knowing which feed they belong
/// to; try the video feed first, then the image feed.
async fn ensure_item(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.store.load(ContentKind::VideoFeed).await?;
    if ctx.store.get(id).is_some() {
        return Ok(());
    }
    ctx.store.load(ContentKind::ImageFeed).await?;
    if ctx.store.get(id).is_some() {
        return Ok(());
    }
    Err(ClipstreamError::ItemNotFound(id.to_string()))
}

fn item(ctx: &AppContext, id: &str) -> Result<crate::domain::FeedItem> {
    ctx.store
        .get(id)
        .ok_or_else(|| ClipstreamError::ItemNotFound(id.to_string()))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}…", cut)
    }
}
