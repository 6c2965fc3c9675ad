//! YouTube downloads with automatic PO Token management.
//!
//! Every run passes the provider's token to yt-dlp as
//! `po_token=android.gvs+<token>`. When YouTube answers 403 the token is
//! dropped from the cache so the next request generates a fresh one.

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config;
use crate::core::error::AppResult;
use crate::download::error::DownloadError;
use crate::download::media::{ContentKind, DownloadedMedia};
use crate::download::ytdlp::{self, YtDlpFailure, PRINT_RESULT_TEMPLATE};
use crate::download::ytdlp_errors::{analyze_ytdlp_error, is_token_rejection, should_notify_admin, to_download_error};
use crate::potoken::PoTokenProvider;

/// Subset of the yt-dlp info document used for pre-flight checks
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    pub id: String,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub channel_id: Option<String>,
    pub duration: Option<f64>,
    pub is_live: Option<bool>,
    pub was_live: Option<bool>,
    pub is_upcoming: Option<bool>,
    pub live_status: Option<String>,
    pub categories: Vec<String>,
    pub genre: Option<String>,
    pub tags: Vec<String>,
    pub formats: Vec<serde_json::Value>,
}

/// Rejects live streams, format-less videos and videos over the length limit.
pub fn check_availability(info: &VideoInfo) -> Result<(), DownloadError> {
    let live_status = info.live_status.as_deref();

    if info.is_live == Some(true) || live_status == Some("is_live") {
        return Err(DownloadError::LiveStream);
    }
    if live_status == Some("post_live") {
        return Err(DownloadError::PostLive);
    }

    if info.formats.is_empty() {
        if info.was_live == Some(true) || info.is_upcoming == Some(true) || live_status == Some("is_upcoming") {
            return Err(DownloadError::Unavailable(
                "stream has not started or is still processing".to_string(),
            ));
        }
        return Err(DownloadError::Unavailable("no formats available".to_string()));
    }

    let duration = info.duration.unwrap_or(0.0).max(0.0) as u64;
    if duration > config::youtube::MAX_DURATION_SECS {
        return Err(DownloadError::TooLong { minutes: duration / 60 });
    }

    Ok(())
}

const MUSIC_GENRES: [&str; 5] = ["music", "song", "audio", "soundtrack", "ost"];

const MUSIC_TITLE_KEYWORDS: [&str; 13] = [
    "official music video",
    "official video",
    "official audio",
    "lyrics",
    "lyric video",
    "(audio)",
    "[audio]",
    "full album",
    "ost",
    "soundtrack",
    "original sound",
    "music video",
    "mv",
];

const MUSIC_CHANNEL_MARKERS: [&str; 5] = ["vevo", "official", " - topic", "records", "music"];

const MUSIC_TAGS: [&str; 4] = ["music", "song", "audio", "official"];

/// Heuristic: should this video be delivered as audio?
pub fn is_music_content(info: &VideoInfo) -> bool {
    if info.categories.iter().any(|c| c == "Music") {
        return true;
    }

    if let Some(genre) = &info.genre {
        let genre = genre.to_lowercase();
        if MUSIC_GENRES.iter().any(|g| genre.contains(g)) {
            return true;
        }
    }

    if let Some(title) = &info.title {
        let title = title.to_lowercase();
        if MUSIC_TITLE_KEYWORDS.iter().any(|k| title.contains(k)) {
            return true;
        }
    }

    if let Some(uploader) = &info.uploader {
        let uploader = uploader.to_lowercase();
        if MUSIC_CHANNEL_MARKERS.iter().any(|m| uploader.contains(m)) {
            return true;
        }
        if info.channel_id.is_some() && uploader.contains("topic") {
            return true;
        }
    }

    // Short videos with music tags
    let duration = info.duration.unwrap_or(0.0);
    if duration > 0.0 && duration < 600.0 {
        return info
            .tags
            .iter()
            .any(|tag| MUSIC_TAGS.contains(&tag.to_lowercase().as_str()));
    }

    false
}

/// `--extractor-args` value for YouTube, with the PO Token when there is one.
pub fn extractor_args(po_token: &str, skip: &[&str]) -> String {
    let mut args = format!("youtube:player_client={}", config::youtube::PLAYER_CLIENTS.join(","));
    if !skip.is_empty() {
        args.push_str(";skip=");
        args.push_str(&skip.join(","));
    }
    if !po_token.is_empty() {
        args.push_str(&format!(";po_token={}.gvs+{}", config::potoken::DEFAULT_CLIENT, po_token));
    }
    args
}

fn common_args(po_token: &str, skip: &[&str]) -> Vec<String> {
    vec![
        "--no-playlist".to_string(),
        "--extractor-args".to_string(),
        extractor_args(po_token, skip),
        "--user-agent".to_string(),
        config::youtube::ANDROID_USER_AGENT.to_string(),
        "--add-header".to_string(),
        "Accept-Language:en-US,en;q=0.9".to_string(),
    ]
}

/// Arguments of the metadata-only pre-flight run
pub fn info_args(url: &str, po_token: &str) -> Vec<String> {
    let mut args = vec![
        "--dump-single-json".to_string(),
        "--skip-download".to_string(),
        "--quiet".to_string(),
        "--no-warnings".to_string(),
    ];
    args.extend(common_args(po_token, &["hls"]));
    args.push(url.to_string());
    args
}

/// Arguments of the actual download
pub fn download_args(url: &str, po_token: &str, kind: ContentKind, output_dir: &std::path::Path) -> Vec<String> {
    let mut args: Vec<String> = match kind {
        ContentKind::Audio => vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--audio-quality".to_string(),
            "192K".to_string(),
            "-o".to_string(),
            output_dir.join("youtube_audio_%(id)s.%(ext)s").display().to_string(),
        ],
        ContentKind::Video => vec![
            "-f".to_string(),
            "bv*[height<=720][ext=mp4]+ba[ext=m4a]/b[height<=720][ext=mp4]/b[height<=720]/best".to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "-o".to_string(),
            output_dir.join("youtube_video_%(id)s.%(ext)s").display().to_string(),
        ],
    };

    let retries = config::download::YTDLP_RETRIES.to_string();
    args.extend([
        "--retries".to_string(),
        retries.clone(),
        "--fragment-retries".to_string(),
        retries,
        "--skip-unavailable-fragments".to_string(),
        "--max-filesize".to_string(),
        ytdlp::max_filesize_arg(),
        "--no-check-certificates".to_string(),
        "--geo-bypass".to_string(),
        "--print".to_string(),
        PRINT_RESULT_TEMPLATE.to_string(),
    ]);
    args.extend(common_args(po_token, &["hls", "dash"]));
    args.push(url.to_string());
    args
}

pub struct YoutubeDownloader {
    provider: Arc<PoTokenProvider>,
    bin: String,
    output_dir: PathBuf,
}

impl YoutubeDownloader {
    pub fn new(provider: Arc<PoTokenProvider>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            bin: config::YTDL_BIN.clone(),
            output_dir: output_dir.into(),
        }
    }

    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    /// Downloads `url` as audio or video depending on its content.
    pub async fn download(&self, url: &str) -> AppResult<DownloadedMedia> {
        fs_err::tokio::create_dir_all(&self.output_dir).await?;

        let client = config::potoken::DEFAULT_CLIENT;
        let po_token = self.provider.token_for(client).await;

        let output = self
            .run_with_token(&info_args(url, &po_token), &po_token, client, config::download::ytdlp_timeout())
            .await?;
        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        check_availability(&info)?;

        let kind = if is_music_content(&info) {
            ContentKind::Audio
        } else {
            ContentKind::Video
        };
        log::info!("Downloading YouTube {} {} as {}", info.id, url, kind);
        if !po_token.is_empty() {
            let preview: String = po_token.chars().take(30).collect();
            log::debug!("Using PO Token for download: {}...", preview);
        }

        let output = self
            .run_with_token(
                &download_args(url, &po_token, kind, &self.output_dir),
                &po_token,
                client,
                config::download::ytdlp_timeout(),
            )
            .await?;
        let printed = ytdlp::parse_printed_result(&output.stdout)?;
        let size = ytdlp::verify_file(&printed.filepath)?;

        let title = info.title.clone().or(printed.title).unwrap_or_else(|| "YouTube Content".to_string());
        let title = match kind {
            ContentKind::Audio => format!(
                "🎵 {} - {}",
                title,
                info.uploader.as_deref().unwrap_or("Unknown Artist")
            ),
            ContentKind::Video => format!("🎥 {}", title),
        };

        Ok(DownloadedMedia {
            path: printed.filepath,
            kind,
            size,
            title,
        })
    }

    async fn run_with_token(
        &self,
        args: &[String],
        po_token: &str,
        client: &str,
        timeout: std::time::Duration,
    ) -> Result<std::process::Output, DownloadError> {
        match ytdlp::run(&self.bin, args, timeout).await? {
            Ok(output) => Ok(output),
            Err(YtDlpFailure { code, stderr }) => {
                let error_type = analyze_ytdlp_error(&stderr);
                if should_notify_admin(&error_type) {
                    log::error!("yt-dlp failed ({:?}, exit {:?}): {}", error_type, code, stderr);
                } else {
                    log::warn!("yt-dlp failed ({:?}, exit {:?})", error_type, code);
                }
                if is_token_rejection(&error_type) && !po_token.is_empty() {
                    self.provider.invalidate(client).await;
                }
                Err(to_download_error(&error_type, &stderr))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::Path;

    fn info(value: serde_json::Value) -> VideoInfo {
        serde_json::from_value(value).unwrap()
    }

    // ==================== extractor_args() ====================

    #[test]
    fn test_extractor_args_with_token() {
        assert_eq!(
            extractor_args("abc", &["hls", "dash"]),
            "youtube:player_client=android,android_embedded,ios;skip=hls,dash;po_token=android.gvs+abc"
        );
    }

    #[test]
    fn test_extractor_args_without_token() {
        assert_eq!(
            extractor_args("", &["hls"]),
            "youtube:player_client=android,android_embedded,ios;skip=hls"
        );
        assert_eq!(extractor_args("", &[]), "youtube:player_client=android,android_embedded,ios");
    }

    #[test]
    fn test_download_args_shape() {
        let args = download_args("https://youtu.be/x", "tok", ContentKind::Audio, Path::new("/tmp/out"));
        assert!(args.contains(&"bestaudio/best".to_string()));
        assert!(args.contains(&"/tmp/out/youtube_audio_%(id)s.%(ext)s".to_string()));
        assert!(args.contains(&PRINT_RESULT_TEMPLATE.to_string()));
        assert_eq!(args.last().unwrap(), "https://youtu.be/x");

        let args = download_args("https://youtu.be/x", "", ContentKind::Video, Path::new("/tmp/out"));
        assert!(args.contains(&"mp4".to_string()));
        assert!(!args.iter().any(|a| a.contains("po_token")));
    }

    // ==================== check_availability() ====================

    #[test]
    fn test_live_stream_rejected() {
        let live = info(json!({ "id": "x", "is_live": true, "formats": [{}] }));
        assert_eq!(check_availability(&live), Err(DownloadError::LiveStream));

        let live = info(json!({ "id": "x", "live_status": "is_live", "formats": [{}] }));
        assert_eq!(check_availability(&live), Err(DownloadError::LiveStream));
    }

    #[test]
    fn test_post_live_rejected() {
        let post = info(json!({ "id": "x", "live_status": "post_live", "formats": [{}] }));
        assert_eq!(check_availability(&post), Err(DownloadError::PostLive));
    }

    #[test]
    fn test_no_formats_rejected() {
        let empty = info(json!({ "id": "x", "formats": [] }));
        assert!(matches!(check_availability(&empty), Err(DownloadError::Unavailable(_))));

        let upcoming = info(json!({ "id": "x", "is_upcoming": true }));
        assert!(matches!(check_availability(&upcoming), Err(DownloadError::Unavailable(_))));
    }

    #[test]
    fn test_duration_limit() {
        let ok = info(json!({ "id": "x", "duration": 1200, "formats": [{}] }));
        assert_eq!(check_availability(&ok), Ok(()));

        let long = info(json!({ "id": "x", "duration": 1500.5, "formats": [{}] }));
        assert_eq!(check_availability(&long), Err(DownloadError::TooLong { minutes: 25 }));
    }

    // ==================== is_music_content() ====================

    #[test]
    fn test_music_by_category() {
        assert!(is_music_content(&info(json!({ "categories": ["Music"] }))));
    }

    #[test]
    fn test_music_by_title_or_channel() {
        assert!(is_music_content(&info(json!({ "title": "Song (Official Audio)" }))));
        assert!(is_music_content(&info(json!({ "uploader": "ArtistVEVO" }))));
        assert!(is_music_content(&info(json!({ "uploader": "Artist - Topic" }))));
    }

    #[test]
    fn test_music_by_short_duration_and_tags() {
        assert!(is_music_content(&info(json!({ "duration": 200, "tags": ["Song", "pop"] }))));
        assert!(!is_music_content(&info(json!({ "duration": 900, "tags": ["song"] }))));
    }

    #[test]
    fn test_regular_video_is_not_music() {
        let v = info(json!({
            "title": "How to fix a bike",
            "uploader": "Bike Shop",
            "categories": ["Howto & Style"],
            "duration": 420,
            "tags": ["bike", "repair"]
        }));
        assert!(!is_music_content(&v));
    }
}
