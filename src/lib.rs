//! TikTube - media download engine for a Telegram bot
//!
//! Accepts TikTok, YouTube, Instagram, X, Reddit and Pinterest links and
//! downloads them with yt-dlp. YouTube requests carry a PO Token that is
//! cached on disk and regenerated when it expires or gets rejected.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, process execution
//! - `potoken`: PO Token cache, generator and provider
//! - `download`: platform routing and yt-dlp runs
//! - `cli`: command line interface of the binary

pub mod cli;
pub mod core;
pub mod download;
pub mod potoken;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use download::{DownloadedMedia, Downloader};
pub use potoken::{PoTokenCache, PoTokenGenerator, PoTokenProvider};
