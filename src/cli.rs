use clap::{Parser, Subcommand};

use crate::core::config;

#[derive(Parser)]
#[command(name = "tiktube")]
#[command(author, version, about = "Media downloader with YouTube PO Token management", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a TikTok, YouTube, Instagram, X, Reddit or Pinterest link
    Fetch {
        /// Link to download
        url: String,

        /// Output directory (defaults to TEMP_DIR)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Inspect and manage the PO Token cache
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
pub enum TokenAction {
    /// Print a token, generating one if the cache has none
    Get {
        #[arg(short, long, default_value = config::potoken::DEFAULT_CLIENT)]
        client: String,
    },

    /// Generate a new token even if a valid one is cached
    Refresh {
        #[arg(short, long, default_value = config::potoken::DEFAULT_CLIENT)]
        client: String,
    },

    /// List cached tokens with their expiry
    Show,

    /// Remove the cached token of one client
    Clear {
        #[arg(short, long, default_value = config::potoken::DEFAULT_CLIENT)]
        client: String,
    },

    /// Remove every cached token
    ClearAll,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
