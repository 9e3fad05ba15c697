use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipstream::api::StaticToken;
use clipstream::app::AppContext;
use clipstream::cli::{commands, Cli, Commands};
use clipstream::config::Config;
use clipstream::engagement::{Clipboard, NullClipboard};
use clipstream::notify::Notice;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let token = std::env::var("CLIPSTREAM_TOKEN")
        .context("CLIPSTREAM_TOKEN is not set; export your bearer token")?;
    let clipboard: Arc<dyn Clipboard> = Arc::new(NullClipboard);
    let (mut ctx, mut notices) = AppContext::new(config, Arc::new(StaticToken(token)), clipboard)?;

    // Surface transient notices on stderr while commands run.
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            match notice {
                Notice::Info(message) => eprintln!("{}", message),
                Notice::Error(message) => eprintln!("error: {}", message),
                Notice::HeartBurst { .. } => {}
            }
        }
    });

    match cli.command {
        Commands::Feed { kind } => {
            commands::show_feed(&ctx, kind.into()).await?;
        }
        Commands::Like { id } => {
            commands::like(&ctx, &id).await?;
        }
        Commands::Save { id } => {
            commands::save(&ctx, &id).await?;
        }
        Commands::Share { id } => {
            commands::share(&ctx, &id).await?;
        }
        Commands::Comments { id } => {
            commands::list_comments(&mut ctx, &id).await?;
        }
        Commands::Comment { id, text, reply_to } => {
            commands::post_comment(&mut ctx, &id, &text, reply_to.as_deref()).await?;
        }
        Commands::Download { id, out } => {
            commands::download(&ctx, &id, out).await?;
        }
    }

    Ok(())
}
