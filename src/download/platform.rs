//! Platform detection for incoming links.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Supported source platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    TikTok,
    YouTube,
    Instagram,
    Twitter,
    Reddit,
    Pinterest,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::TikTok,
        Platform::YouTube,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Reddit,
        Platform::Pinterest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::YouTube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Reddit => "reddit",
            Platform::Pinterest => "pinterest",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::TikTok => "TikTok",
            Platform::YouTube => "YouTube",
            Platform::Instagram => "Instagram",
            Platform::Twitter => "X (Twitter)",
            Platform::Reddit => "Reddit",
            Platform::Pinterest => "Pinterest",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Platform::TikTok => &TIKTOK_RE,
            Platform::YouTube => &YOUTUBE_RE,
            Platform::Instagram => &INSTAGRAM_RE,
            Platform::Twitter => &TWITTER_RE,
            Platform::Reddit => &REDDIT_RE,
            Platform::Pinterest => &PINTEREST_RE,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown platform: {}", s))
    }
}

static TIKTOK_RE: Lazy<Regex> = Lazy::new(|| build(r"(?:^|\.)tiktok\.com$"));
static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| build(r"(?:^|\.)(?:youtube\.com|youtu\.be)$"));
static INSTAGRAM_RE: Lazy<Regex> = Lazy::new(|| build(r"(?:^|\.)instagram\.com$"));
static TWITTER_RE: Lazy<Regex> = Lazy::new(|| build(r"(?:^|\.)(?:twitter\.com|x\.com)$"));
static REDDIT_RE: Lazy<Regex> = Lazy::new(|| build(r"(?:^|\.)(?:reddit\.com|redd\.it)$"));
static PINTEREST_RE: Lazy<Regex> = Lazy::new(|| build(r"(?:^|\.)(?:pinterest\.com|pin\.it)$"));

#[allow(clippy::expect_used)]
fn build(pattern: &str) -> Regex {
    // Patterns are compile-time constants covered by tests.
    Regex::new(pattern).expect("valid platform regex")
}

/// Parses a user-supplied link. A missing scheme defaults to https.
pub fn parse_link(url: &str) -> Result<Url, url::ParseError> {
    let url = url.trim();
    match Url::parse(url) {
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", url)),
        parsed => parsed,
    }
}

/// Platform owning the host of `link`. Only the host is matched, never the path or query.
pub fn platform_of(link: &Url) -> Option<Platform> {
    if !matches!(link.scheme(), "http" | "https") {
        return None;
    }
    let host = link.host_str()?;
    Platform::ALL.into_iter().find(|p| p.pattern().is_match(host))
}

/// Detects the platform of `url`, checking platforms in declaration order.
pub fn detect_platform(url: &str) -> Option<Platform> {
    parse_link(url).ok().as_ref().and_then(platform_of)
}
