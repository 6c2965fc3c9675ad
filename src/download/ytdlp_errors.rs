//! Classification of yt-dlp failures
//!
//! Maps yt-dlp stderr to an error category so the downloader can decide
//! whether the PO Token must be dropped and what to tell the user.

use crate::download::error::DownloadError;

/// yt-dlp error categories
#[derive(Debug, Clone, PartialEq)]
pub enum YtDlpErrorType {
    /// Cookies are invalid or rotated
    InvalidCookies,
    /// HTTP 403 / Forbidden: the token or client was rejected
    AuthorizationRejected,
    /// YouTube detected automated access
    BotDetection,
    /// Video removed or region-locked
    VideoUnavailable,
    /// Private video
    PrivateVideo,
    /// Age verification required
    AgeRestricted,
    /// No downloadable formats (live, just-ended stream, processing)
    NoFormats,
    /// Network problems (timeouts, connection)
    NetworkError,
    /// Anything else
    Unknown,
}

/// Analyzes yt-dlp stderr and determines the error type
pub fn analyze_ytdlp_error(stderr: &str) -> YtDlpErrorType {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("cookies are no longer valid")
        || stderr_lower.contains("cookies have likely been rotated")
        || stderr_lower.contains("use --cookies-from-browser")
        || stderr_lower.contains("use --cookies for the authentication")
    {
        return YtDlpErrorType::InvalidCookies;
    }

    // Checked before "sign in" patterns: a 403 page can mention signing in.
    if stderr_lower.contains("http error 403") || stderr_lower.contains("forbidden") {
        return YtDlpErrorType::AuthorizationRejected;
    }

    if stderr_lower.contains("sign in to confirm your age") || stderr_lower.contains("age-restricted") {
        return YtDlpErrorType::AgeRestricted;
    }

    if stderr_lower.contains("sign in to confirm you're not a bot")
        || stderr_lower.contains("bot detection")
        || stderr_lower.contains("unable to extract")
        || stderr_lower.contains("signature extraction failed")
    {
        return YtDlpErrorType::BotDetection;
    }

    if stderr_lower.contains("no video formats found") || stderr_lower.contains("no formats found") {
        return YtDlpErrorType::NoFormats;
    }

    if stderr_lower.contains("private video") || stderr_lower.contains("video is private") {
        return YtDlpErrorType::PrivateVideo;
    }

    if stderr_lower.contains("video unavailable")
        || stderr_lower.contains("this video is not available")
        || stderr_lower.contains("video has been removed")
        || stderr_lower.contains("this video does not exist")
        || stderr_lower.contains("video is not available")
    {
        return YtDlpErrorType::VideoUnavailable;
    }

    if stderr_lower.contains("timed out")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("network")
        || stderr_lower.contains("socket")
        || stderr_lower.contains("failed to connect")
    {
        return YtDlpErrorType::NetworkError;
    }

    YtDlpErrorType::Unknown
}

/// Whether a failed run indicates that the PO Token in use was rejected
pub fn is_token_rejection(error_type: &YtDlpErrorType) -> bool {
    matches!(error_type, YtDlpErrorType::AuthorizationRejected)
}

/// Converts a classified failure into a download error
pub fn to_download_error(error_type: &YtDlpErrorType, stderr: &str) -> DownloadError {
    let detail: String = stderr.trim().chars().take(200).collect();
    match error_type {
        YtDlpErrorType::AuthorizationRejected => DownloadError::AuthorizationRejected(detail),
        YtDlpErrorType::AgeRestricted => DownloadError::AgeRestricted,
        YtDlpErrorType::VideoUnavailable | YtDlpErrorType::PrivateVideo | YtDlpErrorType::NoFormats => {
            DownloadError::Unavailable(detail)
        }
        YtDlpErrorType::InvalidCookies
        | YtDlpErrorType::BotDetection
        | YtDlpErrorType::NetworkError
        | YtDlpErrorType::Unknown => DownloadError::YtDlp(detail),
    }
}

/// Determines whether the admin should look at this error
pub fn should_notify_admin(error_type: &YtDlpErrorType) -> bool {
    matches!(
        error_type,
        YtDlpErrorType::InvalidCookies | YtDlpErrorType::BotDetection | YtDlpErrorType::Unknown
    )
}
