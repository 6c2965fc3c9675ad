//! PO Token generation by probing public videos with yt-dlp.
//!
//! The generator never persists anything and never fails: every problem is
//! logged and reported as `None`. [`PoTokenGenerator::fallback`] supplies the
//! empty token used when generation is impossible.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config;
use crate::potoken::probe::{MetadataProbe, ProbeError, YtDlpProbe};

/// Where a token may hide in the probe metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLocation {
    /// `po_token` at the top level, either keyed by client or a flat string
    TopLevel,
    /// `player_response.poToken.<client>`
    PlayerResponse,
    /// `formats[*].po_token`, first non-empty one
    Formats,
}

impl TokenLocation {
    /// Search order, highest priority first.
    pub const SEARCH_ORDER: [TokenLocation; 3] =
        [TokenLocation::TopLevel, TokenLocation::PlayerResponse, TokenLocation::Formats];

    pub fn extract(self, info: &Value, client: &str) -> Option<String> {
        let found = match self {
            TokenLocation::TopLevel => match info.get("po_token")? {
                Value::Object(per_client) => per_client.get(client).and_then(Value::as_str),
                other => other.as_str(),
            },
            TokenLocation::PlayerResponse => info
                .get("player_response")?
                .get("poToken")?
                .get(client)
                .and_then(Value::as_str),
            TokenLocation::Formats => info
                .get("formats")?
                .as_array()?
                .iter()
                .filter_map(|fmt| fmt.get("po_token").and_then(Value::as_str))
                .find(|token| !token.is_empty()),
        };
        found.filter(|token| !token.is_empty()).map(str::to_string)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenLocation::TopLevel => "po_token",
            TokenLocation::PlayerResponse => "player_response.poToken",
            TokenLocation::Formats => "formats[].po_token",
        }
    }
}

/// Tries every [`TokenLocation`] in order and returns the first hit.
pub fn find_token(info: &Value, client: &str) -> Option<(TokenLocation, String)> {
    TokenLocation::SEARCH_ORDER
        .iter()
        .find_map(|location| location.extract(info, client).map(|token| (*location, token)))
}

pub struct PoTokenGenerator {
    probe: Arc<dyn MetadataProbe>,
    probe_pool: Vec<String>,
    timeout: Duration,
}

impl PoTokenGenerator {
    pub fn new(probe: Arc<dyn MetadataProbe>) -> Self {
        Self {
            probe,
            probe_pool: config::potoken::PROBE_VIDEO_IDS.iter().map(|id| id.to_string()).collect(),
            timeout: config::potoken::generation_timeout(),
        }
    }

    /// Generator backed by the configured yt-dlp binary.
    pub fn with_ytdlp() -> Self {
        Self::new(Arc::new(YtDlpProbe::default()))
    }

    pub fn with_probe_pool(mut self, pool: Vec<String>) -> Self {
        self.probe_pool = pool;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn probe_pool(&self) -> &[String] {
        &self.probe_pool
    }

    /// Probes a random pool video and searches its metadata for a token.
    pub async fn generate(&self, client: &str) -> Option<String> {
        if self.probe_pool.is_empty() {
            log::error!("PO Token probe pool is empty, cannot generate token for {}", client);
            return None;
        }
        let video_id = &self.probe_pool[rand::random::<u32>() as usize % self.probe_pool.len()];

        log::info!("Generating PO Token for {} client (probe: {})...", client, video_id);

        let info = match self.probe.fetch_metadata(video_id, client, self.timeout).await {
            Ok(info) => info,
            Err(ProbeError::Failed { code, stderr }) => {
                log::warn!("yt-dlp extraction failed (exit code: {:?}): {}", code, stderr);
                return None;
            }
            Err(ProbeError::TimedOut(d)) => {
                log::error!("PO Token generation timeout ({}s)", d.as_secs());
                return None;
            }
            Err(e) => {
                log::error!("PO Token generation error: {}", e);
                return None;
            }
        };

        match find_token(&info, client) {
            Some((location, token)) => {
                let preview: String = token.chars().take(30).collect();
                log::info!(
                    "PO Token generated for {} from {}: {}...",
                    client,
                    location.as_str(),
                    preview
                );
                Some(token)
            }
            None => {
                log::warn!("PO Token not found in metadata for {}", client);
                None
            }
        }
    }

    /// Empty token: YouTube still serves some formats, just not the best ones.
    pub fn fallback(&self) -> String {
        log::warn!("Using fallback (no PO Token) - formats may be limited to 360p-480p");
        String::new()
    }
}
