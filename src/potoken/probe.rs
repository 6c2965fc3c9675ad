//! Metadata probe: the generator's only contact with yt-dlp.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use crate::core::config;
use crate::core::process::{run_with_timeout, truncated_lossy, ProcessError};

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("probe timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("yt-dlp exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("failed to run yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("malformed metadata: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<ProcessError> for ProbeError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Timeout(d) => ProbeError::TimedOut(d),
            ProcessError::Io(e) => ProbeError::Spawn(e),
        }
    }
}

/// Fetches the metadata document of one video without downloading media.
#[async_trait]
pub trait MetadataProbe: Send + Sync {
    async fn fetch_metadata(&self, video_id: &str, client: &str, timeout: Duration) -> Result<Value, ProbeError>;
}

/// Runs `yt-dlp --dump-single-json --skip-download` with the requested player client.
#[derive(Debug, Clone)]
pub struct YtDlpProbe {
    bin: String,
}

impl YtDlpProbe {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    fn args(video_id: &str, client: &str) -> Vec<String> {
        vec![
            format!("https://www.youtube.com/watch?v={}", video_id),
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--quiet".to_string(),
            "--extractor-args".to_string(),
            format!("youtube:player_client={}", client),
        ]
    }
}

impl Default for YtDlpProbe {
    fn default() -> Self {
        Self::new(config::YTDL_BIN.as_str())
    }
}

#[async_trait]
impl MetadataProbe for YtDlpProbe {
    async fn fetch_metadata(&self, video_id: &str, client: &str, timeout: Duration) -> Result<Value, ProbeError> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(Self::args(video_id, client));

        let output = run_with_timeout(&mut cmd, timeout).await?;
        if !output.status.success() {
            return Err(ProbeError::Failed {
                code: output.status.code(),
                stderr: truncated_lossy(&output.stderr, 200),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}
