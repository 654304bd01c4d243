//! Response caching with moka
//!
//! Successful read results are cached under a digest of everything that
//! shapes the request (URL, parameters, headers, credentials).
//!
//! # Error Handling
//!
//! Only `Ok(Some(_))` results are cached. Errors and empty results always go
//! back to the API on the next call.

use std::future::Future;
use std::time::Duration;

use airalo_common::sha256_hex;
use airalo_domain::Result;
use moka::future::Cache;
use tracing::debug;

/// Default max capacity per cache.
pub const DEFAULT_RESPONSE_CACHE_MAX_CAPACITY: u64 = 1000;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct ResponseCacheConfig {
    /// Time-to-live for cache entries
    pub ttl: Duration,

    /// Maximum number of entries
    pub max_capacity: u64,
}

impl ResponseCacheConfig {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl, max_capacity: DEFAULT_RESPONSE_CACHE_MAX_CAPACITY }
    }

    /// Log configuration at startup
    pub fn log_config(&self, name: &str) {
        tracing::info!(
            cache = name,
            ttl_seconds = self.ttl.as_secs(),
            max_capacity = self.max_capacity,
            "response cache configuration loaded"
        );
    }
}

/// TTL cache for decoded API results.
#[derive(Clone)]
pub struct ResponseCache<V: Clone + Send + Sync + 'static> {
    name: &'static str,
    inner: Cache<String, V>,
}

impl<V: Clone + Send + Sync + 'static> ResponseCache<V> {
    pub fn new(name: &'static str, config: ResponseCacheConfig) -> Self {
        config.log_config(name);
        let inner = Cache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        Self { name, inner }
    }

    /// Stable key for the parts that identify a request.
    pub fn key<I, P>(parts: I) -> String
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        sha256_hex(parts)
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).await
    }

    /// Return the cached value for `key`, or run `fetch` and cache a
    /// `Some` result.
    ///
    /// # Errors
    /// Propagates the error from `fetch`; nothing is cached in that case.
    pub async fn get_or_fetch<F, Fut>(&self, key: String, fetch: F) -> Result<Option<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>>>,
    {
        if let Some(hit) = self.inner.get(&key).await {
            debug!(cache = self.name, "cache hit");
            return Ok(Some(hit));
        }

        let fetched = fetch().await?;
        if let Some(value) = &fetched {
            self.inner.insert(key, value.clone()).await;
        }
        Ok(fetched)
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl<V: Clone + Send + Sync + 'static> std::fmt::Debug for ResponseCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("name", &self.name)
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}
