use std::fmt;

/// Structured error type for download operations.
///
/// Each variant maps to one user-facing message (`user_message`).
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadError {
    /// Link does not belong to a supported platform
    UnsupportedUrl(String),
    /// Video is private, removed, region-locked or has no formats
    Unavailable(String),
    /// Live broadcast in progress or not started yet
    LiveStream,
    /// Broadcast just ended, YouTube is still processing it
    PostLive,
    /// Longer than the allowed maximum
    TooLong { minutes: u64 },
    /// Remote service answered 403 / Forbidden
    AuthorizationRejected(String),
    /// Video requires sign-in for age verification
    AgeRestricted,
    /// yt-dlp specific failures (bad exit code with unclassified stderr)
    YtDlp(String),
    /// Expected file not found after yt-dlp finished
    FileNotFound(String),
    /// Downloaded file has zero length
    EmptyFile(String),
    /// Download timed out
    Timeout(String),
    /// Process execution failure (spawn)
    Process(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::UnsupportedUrl(url) => write!(f, "unsupported url: {}", url),
            DownloadError::Unavailable(msg) => write!(f, "video unavailable: {}", msg),
            DownloadError::LiveStream => write!(f, "live streams are not supported"),
            DownloadError::PostLive => write!(f, "stream has just ended and is still processing"),
            DownloadError::TooLong { minutes } => write!(f, "video too long ({} min)", minutes),
            DownloadError::AuthorizationRejected(msg) => write!(f, "authorization rejected: {}", msg),
            DownloadError::AgeRestricted => write!(f, "age restricted video"),
            DownloadError::YtDlp(msg)
            | DownloadError::FileNotFound(msg)
            | DownloadError::EmptyFile(msg)
            | DownloadError::Timeout(msg)
            | DownloadError::Process(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

impl DownloadError {
    /// Message for the chat user
    pub fn user_message(&self) -> String {
        match self {
            DownloadError::UnsupportedUrl(_) => {
                "❌ This link is not supported.\n\nSupported: TikTok, YouTube, Instagram, X (Twitter), Reddit, Pinterest."
                    .to_string()
            }
            DownloadError::Unavailable(_) => "❌ Video is unavailable.\n\n\
                It may be private, deleted or blocked in this region."
                .to_string(),
            DownloadError::LiveStream => "❌ Live streams are not supported.".to_string(),
            DownloadError::PostLive => "⏳ The stream has just ended.\n\n\
                Wait 5-10 minutes while YouTube processes the video."
                .to_string(),
            DownloadError::TooLong { minutes } => format!(
                "❌ Video is too long ({} min). Maximum: {} minutes",
                minutes,
                crate::core::config::youtube::MAX_DURATION_SECS / 60
            ),
            DownloadError::AuthorizationRejected(_) => "⚠️ YouTube temporarily restricted access. Try:\n\
                1. Waiting 1-2 minutes\n\
                2. Another link\n\
                3. Copying the link again"
                .to_string(),
            DownloadError::AgeRestricted => "❌ Age-restricted video. Download is not available.".to_string(),
            DownloadError::YtDlp(msg) => {
                let short: String = msg.chars().take(200).collect();
                format!("⚠️ Download error: {}", short)
            }
            DownloadError::FileNotFound(_) => "❌ File was not downloaded.".to_string(),
            DownloadError::EmptyFile(_) => "❌ Downloaded file is empty.".to_string(),
            DownloadError::Timeout(_) => "⏱ Download took too long. Try again later.".to_string(),
            DownloadError::Process(_) => "⚠️ Downloader is not available right now.".to_string(),
        }
    }
}
