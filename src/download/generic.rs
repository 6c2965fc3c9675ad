//! TikTok, Instagram, X, Reddit and Pinterest: a single best-format yt-dlp run.

use std::path::{Path, PathBuf};

use crate::core::config;
use crate::core::error::AppResult;
use crate::download::media::{ContentKind, DownloadedMedia};
use crate::download::platform::Platform;
use crate::download::ytdlp::{self, YtDlpFailure, PRINT_RESULT_TEMPLATE};
use crate::download::ytdlp_errors::{analyze_ytdlp_error, to_download_error};

pub fn generic_args(url: &str, platform: Platform, output_dir: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        "best".to_string(),
        "--no-playlist".to_string(),
        "--quiet".to_string(),
        "--no-warnings".to_string(),
        "--max-filesize".to_string(),
        ytdlp::max_filesize_arg(),
        "-o".to_string(),
        output_dir
            .join(format!("{}_%(id)s.%(ext)s", platform.as_str()))
            .display()
            .to_string(),
        "--print".to_string(),
        PRINT_RESULT_TEMPLATE.to_string(),
        url.to_string(),
    ]
}

pub struct GenericDownloader {
    bin: String,
    output_dir: PathBuf,
}

impl GenericDownloader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin: config::YTDL_BIN.clone(),
            output_dir: output_dir.into(),
        }
    }

    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    pub async fn download(&self, url: &str, platform: Platform) -> AppResult<DownloadedMedia> {
        fs_err::tokio::create_dir_all(&self.output_dir).await?;
        log::info!("Downloading {} content: {}", platform.display_name(), url);

        let args = generic_args(url, platform, &self.output_dir);
        let output = match ytdlp::run(&self.bin, &args, config::download::ytdlp_timeout()).await? {
            Ok(output) => output,
            Err(YtDlpFailure { code, stderr }) => {
                let error_type = analyze_ytdlp_error(&stderr);
                log::warn!("{} download failed ({:?}, exit {:?})", platform, error_type, code);
                return Err(to_download_error(&error_type, &stderr).into());
            }
        };

        let printed = ytdlp::parse_printed_result(&output.stdout)?;
        let size = ytdlp::verify_file(&printed.filepath)?;
        let title = printed
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("{} Video", platform.display_name()));

        Ok(DownloadedMedia {
            path: printed.filepath,
            kind: ContentKind::Video,
            size,
            title,
        })
    }
}
