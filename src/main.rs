use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;

use tiktube::cli::{Cli, Commands, TokenAction};
use tiktube::core::{config, init_logger, log_startup_configuration, logging};
use tiktube::download::{ytdlp, Downloader};
use tiktube::potoken::PoTokenProvider;

/// Entry point
///
/// Parses CLI arguments and dispatches to the subcommand.
///
/// # Errors
/// Returns an error if logging cannot be initialized or a fetch fails.
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env before any config static is read
    let _ = dotenv();

    let cli = Cli::parse_args();

    init_logger(&config::LOG_FILE_PATH, logging::parse_level(&config::LOG_LEVEL))?;
    log_startup_configuration();

    let provider = Arc::new(PoTokenProvider::from_config());

    match cli.command {
        Commands::Fetch { url, output } => {
            ytdlp::log_version(&config::YTDL_BIN).await;
            let output_dir = config::expand_path(output.as_deref().unwrap_or(config::TEMP_DIR.as_str()));
            let downloader = Downloader::new(provider, output_dir);
            match downloader.download(&url).await {
                Ok(media) => {
                    println!("{}", media.title);
                    println!("{} ({}, {} bytes)", media.path.display(), media.kind, media.size);
                    Ok(())
                }
                Err(e) => {
                    log::error!("Download failed for {}: {}", url, e);
                    eprintln!("{}", e.user_message());
                    Err(e.into())
                }
            }
        }
        Commands::Token { action } => {
            run_token_action(&provider, action).await;
            Ok(())
        }
    }
}

async fn run_token_action(provider: &PoTokenProvider, action: TokenAction) {
    match action {
        TokenAction::Get { client } => {
            let token = provider.token_for(&client).await;
            if token.is_empty() {
                eprintln!("No PO Token available for {} (fallback mode)", client);
            } else {
                println!("{}", token);
            }
        }
        TokenAction::Refresh { client } => match provider.refresh(&client).await {
            Some(token) => println!("{}", token),
            None => eprintln!("PO Token generation failed for {}", client),
        },
        TokenAction::Show => {
            let entries = provider.entries().await;
            if entries.is_empty() {
                println!("PO Token cache is empty");
            }
            for (entry, valid) in entries {
                let preview: String = entry.token.chars().take(30).collect();
                println!(
                    "{:<16} {:<8} created {}  expires {}  {}...",
                    entry.client,
                    if valid { "valid" } else { "expired" },
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.expires_at.format("%Y-%m-%d %H:%M"),
                    preview
                );
            }
        }
        TokenAction::Clear { client } => provider.clear(&client).await,
        TokenAction::ClearAll => provider.clear_all().await,
    }
}
