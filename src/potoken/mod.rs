//! YouTube PO Token management
//!
//! - `cache`: file-backed, expiry-aware token store (one entry per player client)
//! - `probe`: yt-dlp metadata probe behind a trait
//! - `generator`: harvests a token from probe metadata, with an empty fallback
//! - `provider`: cache → generate → fallback policy used by the downloader

pub mod cache;
pub mod generator;
pub mod probe;
pub mod provider;

pub use cache::{Clock, PoTokenCache, SystemClock, TokenEntry};
pub use generator::{find_token, PoTokenGenerator, TokenLocation};
pub use probe::{MetadataProbe, ProbeError, YtDlpProbe};
pub use provider::PoTokenProvider;
