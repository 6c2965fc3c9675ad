use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::config;
use crate::potoken::cache::{PoTokenCache, TokenEntry};
use crate::potoken::generator::PoTokenGenerator;

/// Cache-first PO Token source for the YouTube downloader.
///
/// Lookup policy:
/// 1. a valid cached token is returned as-is;
/// 2. otherwise a token is generated and cached for `ttl_days`;
/// 3. if generation fails the empty fallback token is returned.
///
/// The cache lock is never held while generating, so two concurrent misses may
/// both probe yt-dlp; the last one to finish wins the cache slot. Mutations
/// rewrite the cache file and run on the blocking pool.
pub struct PoTokenProvider {
    cache: Arc<Mutex<PoTokenCache>>,
    generator: PoTokenGenerator,
    ttl_days: u32,
    consecutive_failures: AtomicU32,
}

impl PoTokenProvider {
    pub fn new(cache: PoTokenCache, generator: PoTokenGenerator) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
            generator,
            ttl_days: config::potoken::DEFAULT_TTL_DAYS,
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// Provider over the configured cache file and yt-dlp binary.
    pub fn from_config() -> Self {
        Self::new(
            PoTokenCache::open(config::potoken::cache_file()),
            PoTokenGenerator::with_ytdlp(),
        )
    }

    pub fn with_ttl_days(mut self, ttl_days: u32) -> Self {
        self.ttl_days = ttl_days;
        self
    }

    /// Token for `client`; empty when none could be obtained.
    pub async fn token_for(&self, client: &str) -> String {
        let cached = lock(&self.cache).get_token(client);
        if let Some(token) = cached.filter(|t| !t.is_empty()) {
            return token;
        }

        log::info!("PO Token for {} not found or expired, generating new...", client);
        match self.generate_and_store(client).await {
            Some(token) => token,
            None => {
                log::warn!("Failed to generate PO Token for {}, using fallback", client);
                self.generator.fallback()
            }
        }
    }

    /// Generates a new token even if a valid one is cached.
    pub async fn refresh(&self, client: &str) -> Option<String> {
        self.generate_and_store(client).await
    }

    /// Drops the cached token after YouTube rejected a request made with it.
    pub async fn invalidate(&self, client: &str) {
        log::warn!("Invalidating PO Token for {} after authorization rejection", client);
        self.clear(client).await;
    }

    pub async fn clear(&self, client: &str) {
        let client = client.to_string();
        self.update_cache(move |cache| cache.clear_token(&client)).await;
    }

    pub async fn clear_all(&self) {
        self.update_cache(PoTokenCache::clear_all).await;
    }

    /// Snapshot of all entries with their validity at the time of the call.
    pub async fn entries(&self) -> Vec<(TokenEntry, bool)> {
        let cache = lock(&self.cache);
        let now = cache.now();
        cache
            .entries()
            .map(|entry| (entry.clone(), entry.is_valid_at(now)))
            .collect()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    async fn generate_and_store(&self, client: &str) -> Option<String> {
        let Some(token) = self.generator.generate(client).await else {
            self.record_failure();
            return None;
        };

        self.consecutive_failures.store(0, Ordering::Relaxed);
        let (owned_client, owned_token, ttl_days) = (client.to_string(), token.clone(), self.ttl_days);
        self.update_cache(move |cache| cache.set_token_with_ttl(&owned_client, &owned_token, ttl_days))
            .await;
        Some(token)
    }

    /// Applies a persisting cache mutation off the async worker threads.
    async fn update_cache<F>(&self, op: F)
    where
        F: FnOnce(&mut PoTokenCache) + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        if let Err(e) = tokio::task::spawn_blocking(move || op(&mut lock(&cache))).await {
            log::error!("PO Token cache update failed: {}", e);
        }
    }

    fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        let pool_size = self.generator.probe_pool().len().max(1) as u32;
        if failures == pool_size {
            log::error!(
                "PO Token generation failed {} times in a row; probe videos {:?} may be unavailable or region-restricted",
                failures,
                self.generator.probe_pool()
            );
        }
    }
}

fn lock(cache: &Mutex<PoTokenCache>) -> MutexGuard<'_, PoTokenCache> {
    cache.lock().unwrap_or_else(|e| e.into_inner())
}
