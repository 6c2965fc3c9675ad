//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tiktube::potoken::{Clock, MetadataProbe, ProbeError};

/// Clock that only moves when told to
pub struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    pub fn starting_at(ts: NaiveDateTime) -> Arc<Self> {
        Arc::new(Self(Mutex::new(ts)))
    }

    pub fn new_year_2024() -> Arc<Self> {
        Self::starting_at(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}

/// Probe returning queued responses in order, then failing
pub struct QueuedProbe {
    responses: Mutex<Vec<Result<Value, ProbeError>>>,
    pub calls: AtomicUsize,
}

impl QueuedProbe {
    pub fn new(mut responses: Vec<Result<Value, ProbeError>>) -> Arc<Self> {
        responses.reverse();
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProbe for QueuedProbe {
    async fn fetch_metadata(&self, _video_id: &str, _client: &str, _timeout: std::time::Duration) -> Result<Value, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses.lock().unwrap().pop().unwrap_or_else(|| {
            Err(ProbeError::Failed {
                code: Some(1),
                stderr: "ERROR: probe unreachable".to_string(),
            })
        })
    }
}

/// Metadata carrying `token` for the android client
pub fn token_doc(token: &str) -> Result<Value, ProbeError> {
    token_doc_for("android", token)
}

pub fn token_doc_for(client: &str, token: &str) -> Result<Value, ProbeError> {
    let mut per_client = serde_json::Map::new();
    per_client.insert(client.to_string(), Value::from(token));
    Ok(serde_json::json!({ "id": "dQw4w9WgXcQ", "po_token": per_client }))
}

pub fn unreachable() -> Result<Value, ProbeError> {
    Err(ProbeError::Failed {
        code: Some(1),
        stderr: "ERROR: Unable to download webpage".to_string(),
    })
}

/// Writes an executable shell script standing in for yt-dlp.
///
/// Every invocation appends its arguments to `calls.log` in `dir`. Metadata
/// runs (`--dump-single-json`) print `info_json`; all other runs execute
/// `download_body`.
#[cfg(unix)]
pub fn fake_ytdlp(dir: &Path, info_json: &str, download_body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-yt-dlp");
    let log = dir.join("calls.log");
    let body = format!(
        "#!/bin/sh\n\
         echo \"$*\" >> '{log}'\n\
         case \"$*\" in\n\
         *--dump-single-json*)\n\
         cat <<'JSON'\n{info}\nJSON\n\
         ;;\n\
         *)\n\
         {download}\n\
         ;;\n\
         esac\n",
        log = log.display(),
        info = info_json,
        download = download_body,
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Lines of `calls.log` written by [`fake_ytdlp`]
pub fn recorded_calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
