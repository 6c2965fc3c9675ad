//! Process execution utilities with timeout support
//!
//! Provides helpers for running external processes (yt-dlp) with configurable
//! timeouts to prevent hung processes from blocking the pipeline.

use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Failure to obtain the output of an external process.
///
/// A non-zero exit status is *not* an error here: callers inspect
/// `Output::status` themselves because yt-dlp failures carry useful stderr.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Process timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Failed to run process: {0}")]
    Io(#[from] std::io::Error),
}

/// Run an async Command with a timeout.
///
/// The child is killed when the timeout elapses.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, ProcessError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ProcessError::Io(e)),
        Err(_) => Err(ProcessError::Timeout(timeout)),
    }
}

/// First `max_chars` characters of a process stream, lossily decoded.
pub fn truncated_lossy(bytes: &[u8], max_chars: usize) -> String {
    String::from_utf8_lossy(bytes).trim().chars().take(max_chars).collect()
}
