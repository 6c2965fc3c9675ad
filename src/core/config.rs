use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Persistent state directory (token cache and friends)
/// Read from STORAGE_DIR environment variable
/// Default: ./storage, supports tilde (~) expansion
pub static STORAGE_DIR: Lazy<String> =
    Lazy::new(|| env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string()));

/// Explicit PO Token cache file, overrides `<STORAGE_DIR>/po_token_cache.json`
/// Read from PO_TOKEN_CACHE_FILE environment variable
pub static PO_TOKEN_CACHE_FILE: Lazy<Option<String>> =
    Lazy::new(|| env::var("PO_TOKEN_CACHE_FILE").ok().filter(|s| !s.is_empty()));

/// Temporary directory for downloaded media
/// Read from TEMP_DIR environment variable
/// Default: ./temp
pub static TEMP_DIR: Lazy<String> = Lazy::new(|| env::var("TEMP_DIR").unwrap_or_else(|_| "./temp".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Log level (error, warn, info, debug, trace)
/// Read from LOG_LEVEL environment variable
/// Default: info
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Maximum size of a downloaded file in megabytes
/// Read from MAX_FILE_SIZE_MB environment variable
/// Default: 50 (Telegram Bot API upload limit)
pub static MAX_FILE_SIZE_MB: Lazy<u64> = Lazy::new(|| {
    env::var("MAX_FILE_SIZE_MB")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(50)
});

/// Expands `~` in a configured path.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// PO Token configuration
pub mod potoken {
    use super::{expand_path, Duration, PathBuf, PO_TOKEN_CACHE_FILE, STORAGE_DIR};

    /// File name of the token cache inside STORAGE_DIR
    pub const CACHE_FILE_NAME: &str = "po_token_cache.json";

    /// Lifetime of a freshly generated token (in days)
    pub const DEFAULT_TTL_DAYS: u32 = 3;

    /// Timeout for the yt-dlp metadata probe (in seconds)
    pub const GENERATION_TIMEOUT_SECS: u64 = 30;

    /// Player client used for downloads
    pub const DEFAULT_CLIENT: &str = "android";

    /// Long-lived public videos used as probe targets
    pub const PROBE_VIDEO_IDS: [&str; 3] = [
        "dQw4w9WgXcQ", // Rick Astley - Never Gonna Give You Up
        "9bZkp7q19f0", // PSY - Gangnam Style
        "kJQP7kiw5Fk", // Luis Fonsi - Despacito
    ];

    /// Generation timeout duration
    pub fn generation_timeout() -> Duration {
        Duration::from_secs(GENERATION_TIMEOUT_SECS)
    }

    /// Resolved token cache path
    pub fn cache_file() -> PathBuf {
        match PO_TOKEN_CACHE_FILE.as_deref() {
            Some(path) => expand_path(path),
            None => expand_path(&STORAGE_DIR).join(CACHE_FILE_NAME),
        }
    }
}

/// YouTube download configuration
pub mod youtube {
    /// Longest video we accept (in seconds)
    pub const MAX_DURATION_SECS: u64 = 20 * 60;

    /// Player clients in priority order
    pub const PLAYER_CLIENTS: [&str; 3] = ["android", "android_embedded", "ios"];

    /// User-Agent of the Android YouTube app
    pub const ANDROID_USER_AGENT: &str = "com.google.android.youtube/19.09.37 (Linux; U; Android 11) gzip";
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for yt-dlp commands (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 240; // 4 minutes, to avoid timeouts on slow metadata fetches

    /// Retries passed to yt-dlp for requests and fragments
    pub const YTDLP_RETRIES: u32 = 10;

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }
}
