//! Download management: platform routing, yt-dlp runs and error classification

pub mod error;
pub mod generic;
pub mod media;
pub mod platform;
pub mod youtube;
pub mod ytdlp;
pub mod ytdlp_errors;

use std::path::PathBuf;
use std::sync::Arc;

pub use error::DownloadError;
pub use generic::GenericDownloader;
pub use media::{ContentKind, DownloadedMedia};
pub use platform::{detect_platform, parse_link, Platform};
pub use youtube::YoutubeDownloader;

use crate::core::error::AppResult;
use crate::potoken::PoTokenProvider;

/// Routes a link to the YouTube or the generic downloader.
pub struct Downloader {
    youtube: YoutubeDownloader,
    generic: GenericDownloader,
}

impl Downloader {
    pub fn new(provider: Arc<PoTokenProvider>, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            youtube: YoutubeDownloader::new(provider, output_dir.clone()),
            generic: GenericDownloader::new(output_dir),
        }
    }

    pub fn with_bin(self, bin: &str) -> Self {
        Self {
            youtube: self.youtube.with_bin(bin),
            generic: self.generic.with_bin(bin),
        }
    }

    /// Downloads `url`; unparseable or unsupported links fail before yt-dlp runs.
    pub async fn download(&self, url: &str) -> AppResult<DownloadedMedia> {
        let link = platform::parse_link(url)?;
        let platform =
            platform::platform_of(&link).ok_or_else(|| DownloadError::UnsupportedUrl(url.trim().to_string()))?;
        match platform {
            Platform::YouTube => self.youtube.download(link.as_str()).await,
            other => self.generic.download(link.as_str(), other).await,
        }
    }
}
