//! Thin async wrapper around the yt-dlp binary.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::core::config;
use crate::core::process::{run_with_timeout, truncated_lossy, ProcessError};
use crate::download::error::DownloadError;

/// Template printed after the final move: title and absolute path as one JSON object.
pub const PRINT_RESULT_TEMPLATE: &str = "after_move:%(.{title,filepath})j";

/// What yt-dlp reports for a finished download
#[derive(Debug, Clone, Deserialize)]
pub struct PrintedResult {
    #[serde(default)]
    pub title: Option<String>,
    pub filepath: PathBuf,
}

/// Failed yt-dlp run with its (trimmed) stderr
#[derive(Debug, Clone)]
pub struct YtDlpFailure {
    pub code: Option<i32>,
    pub stderr: String,
}

/// Runs yt-dlp with `args`, returning stdout on success.
///
/// `Ok(Err(_))` is a run that completed with a non-zero exit; the caller
/// classifies its stderr.
pub async fn run(bin: &str, args: &[String], timeout: Duration) -> Result<Result<Output, YtDlpFailure>, DownloadError> {
    log::debug!("Running {} {}", bin, args.join(" "));
    let mut cmd = Command::new(bin);
    cmd.args(args);

    let output = run_with_timeout(&mut cmd, timeout).await.map_err(|e| match e {
        ProcessError::Timeout(d) => DownloadError::Timeout(format!("yt-dlp timed out after {}s", d.as_secs())),
        ProcessError::Io(e) => DownloadError::Process(format!("failed to run {}: {}", bin, e)),
    })?;

    if output.status.success() {
        Ok(Ok(output))
    } else {
        Ok(Err(YtDlpFailure {
            code: output.status.code(),
            stderr: truncated_lossy(&output.stderr, 2000),
        }))
    }
}

/// Parses the last `PRINT_RESULT_TEMPLATE` line of stdout and checks the file.
pub fn parse_printed_result(stdout: &[u8]) -> Result<PrintedResult, DownloadError> {
    let stdout = String::from_utf8_lossy(stdout);
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
        .ok_or_else(|| DownloadError::FileNotFound("yt-dlp did not report an output file".to_string()))?;

    serde_json::from_str(line)
        .map_err(|e| DownloadError::FileNotFound(format!("unreadable yt-dlp result line: {}", e)))
}

/// Size of a finished download; missing or empty files are errors.
pub fn verify_file(path: &Path) -> Result<u64, DownloadError> {
    let size = fs_err::metadata(path)
        .map_err(|_| DownloadError::FileNotFound(path.display().to_string()))?
        .len();
    if size == 0 {
        return Err(DownloadError::EmptyFile(path.display().to_string()));
    }
    Ok(size)
}

/// `--max-filesize` value from configuration
pub fn max_filesize_arg() -> String {
    format!("{}M", *config::MAX_FILE_SIZE_MB)
}

/// Logs the installed yt-dlp version at startup
pub async fn log_version(bin: &str) {
    let mut cmd = Command::new(bin);
    cmd.arg("--version");
    match run_with_timeout(&mut cmd, Duration::from_secs(10)).await {
        Ok(output) if output.status.success() => {
            log::info!("Current yt-dlp version: {}", truncated_lossy(&output.stdout, 64));
        }
        Ok(output) => log::warn!("yt-dlp --version exited with {:?}", output.status.code()),
        Err(e) => log::warn!("Failed to get yt-dlp version: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_printed_result_takes_last_json_line() {
        let stdout = b"[download] 100%\n{\"title\": \"a\", \"filepath\": \"/tmp/a.mp4\"}\n{\"title\": \"b\", \"filepath\": \"/tmp/b.mp4\"}\n";
        let result = parse_printed_result(stdout).unwrap();
        assert_eq!(result.title.as_deref(), Some("b"));
        assert_eq!(result.filepath, PathBuf::from("/tmp/b.mp4"));
    }

    #[test]
    fn test_parse_printed_result_without_json() {
        let err = parse_printed_result(b"[download] done\n").unwrap_err();
        assert!(matches!(err, DownloadError::FileNotFound(_)));
    }

    #[test]
    fn test_verify_file() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.mp4");
        let full = dir.path().join("full.mp4");
        fs_err::write(&empty, b"").unwrap();
        fs_err::write(&full, b"data").unwrap();

        assert_eq!(verify_file(&full).unwrap(), 4);
        assert!(matches!(verify_file(&empty), Err(DownloadError::EmptyFile(_))));
        assert!(matches!(
            verify_file(&dir.path().join("missing.mp4")),
            Err(DownloadError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_run_missing_binary() {
        let result = run("definitely-not-yt-dlp-7f3a", &[], Duration::from_secs(1)).await;
        assert!(matches!(result, Err(DownloadError::Process(_))));
    }
}
