//! File-backed PO Token cache.
//!
//! One [`TokenEntry`] per player client, mirrored to a single JSON document:
//!
//! ```json
//! {
//!   "android": {
//!     "token": "abc123...",
//!     "created_at": "2024-01-01T00:00:00",
//!     "expires_at": "2024-01-04T00:00:00"
//!   }
//! }
//! ```
//!
//! The document is loaded once at construction and rewritten in full after
//! every mutation. No operation returns an error: a broken file means an empty
//! cache, a failed write means the in-memory map stays authoritative.

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::config;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in local time, truncated to microseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        now.with_nanosecond(now.nanosecond() / 1_000 * 1_000).unwrap_or(now)
    }
}

/// One cached token for one player client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Player client (the key of the document object)
    #[serde(skip)]
    pub client: String,
    pub token: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl TokenEntry {
    /// Valid iff `now` is strictly before `expires_at`.
    pub fn is_valid_at(&self, now: NaiveDateTime) -> bool {
        now < self.expires_at
    }
}

pub struct PoTokenCache {
    path: PathBuf,
    entries: BTreeMap<String, TokenEntry>,
    clock: Arc<dyn Clock>,
}

impl PoTokenCache {
    /// Opens the cache at `path` using the system clock.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    /// Opens the cache at `path` reading time from `clock`.
    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs_err::create_dir_all(parent) {
                log::warn!("PoTokenCache: {}", e);
            }
        }
        let entries = load_entries(&path);
        Self { path, entries, clock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the token for `client` if it exists and has not expired.
    pub fn get_token(&self, client: &str) -> Option<String> {
        let Some(entry) = self.entries.get(client) else {
            log::debug!("No cached PO Token for {}", client);
            return None;
        };

        if !entry.is_valid_at(self.clock.now()) {
            log::info!("PO Token for {} expired at {}", client, entry.expires_at);
            return None;
        }

        log::debug!(
            "Using cached PO Token for {} (expires: {})",
            client,
            entry.expires_at.format("%Y-%m-%d %H:%M")
        );
        Some(entry.token.clone())
    }

    /// Stores `token` for `client` with the default TTL.
    pub fn set_token(&mut self, client: &str, token: &str) {
        self.set_token_with_ttl(client, token, config::potoken::DEFAULT_TTL_DAYS);
    }

    /// Stores `token` for `client`, replacing any previous entry, and persists.
    pub fn set_token_with_ttl(&mut self, client: &str, token: &str, ttl_days: u32) {
        let now = self.clock.now();
        let expires_at = Duration::try_days(i64::from(ttl_days))
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(NaiveDateTime::MAX);

        self.entries.insert(
            client.to_string(),
            TokenEntry {
                client: client.to_string(),
                token: token.to_string(),
                created_at: now,
                expires_at,
            },
        );

        self.save();
        log::info!(
            "PO Token for {} cached until {}",
            client,
            expires_at.format("%Y-%m-%d %H:%M")
        );
    }

    /// Removes the entry for `client`. No-op if there is none.
    pub fn clear_token(&mut self, client: &str) {
        if self.entries.remove(client).is_some() {
            self.save();
            log::info!("PO Token for {} cleared from cache", client);
        }
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.save();
        log::info!("PO Token cache cleared");
    }

    /// Raw entry for `client`, expired or not.
    pub fn entry(&self, client: &str) -> Option<&TokenEntry> {
        self.entries.get(client)
    }

    /// All entries ordered by client, expired ones included.
    pub fn entries(&self) -> impl Iterator<Item = &TokenEntry> {
        self.entries.values()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    fn save(&self) {
        if let Err(e) = write_entries(&self.path, &self.entries) {
            log::error!("Failed to save PO Token cache to {}: {}", self.path.display(), e);
        } else {
            log::debug!("PO Token cache saved to {}", self.path.display());
        }
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, TokenEntry> {
    let content = match fs_err::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No PO Token cache at {}, starting empty", path.display());
            return BTreeMap::new();
        }
        Err(e) => {
            log::warn!("Failed to load PO Token cache: {}", e);
            return BTreeMap::new();
        }
    };

    match serde_json::from_str::<BTreeMap<String, TokenEntry>>(&content) {
        Ok(mut entries) => {
            for (client, entry) in entries.iter_mut() {
                entry.client = client.clone();
            }
            log::debug!("PO Token cache loaded from {}", path.display());
            entries
        }
        Err(e) => {
            log::warn!("Failed to parse PO Token cache {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

/// Full rewrite through a sibling temp file so readers never see a torn document.
fn write_entries(path: &Path, entries: &BTreeMap<String, TokenEntry>) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(entries)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs_err::write(&tmp, json)?;
    if let Err(e) = fs_err::rename(&tmp, path) {
        let _ = fs_err::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
