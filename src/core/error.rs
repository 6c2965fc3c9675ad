use thiserror::Error;

use crate::download::error::DownloadError;

/// Centralized error types for the application
///
/// Errors from the download pipeline, link parsing and I/O are converted
/// into this enum so the CLI (and a chat layer on top of it) can report them
/// uniformly. The PO Token subsystem never produces one of these: its failures
/// degrade to "no token" instead.
///
/// # Example
///
/// ```no_run
/// use tiktube::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Categorized download failures
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Link that does not parse as a URL
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Message that can be shown to a chat user as-is.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Download(err) => err.user_message(),
            AppError::Url(_) => "❌ This does not look like a link.".to_string(),
            _ => "⚠️ Something went wrong. Please try again later.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_converts() {
        let err: AppError = DownloadError::TooLong { minutes: 42 }.into();
        assert!(matches!(err, AppError::Download(_)));
        assert!(err.user_message().contains("42"));
    }

    #[test]
    fn test_io_error_user_message_is_generic() {
        let err: AppError = std::io::Error::other("disk on fire").into();
        assert!(!err.user_message().contains("disk on fire"));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_url_error_user_message() {
        let err: AppError = url::Url::parse("https://").unwrap_err().into();
        assert!(matches!(err, AppError::Url(_)));
        assert_eq!(err.user_message(), "❌ This does not look like a link.");
    }
}
