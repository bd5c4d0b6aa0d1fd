//! Per-URL cache of platform key sets.
//!
//! Each platform publishes its public keys at a `/.well-known/jwks.json`
//! URL. The cache keeps one entry per URL and serves it until the TTL runs
//! out; the next request after that fetches again. There is no background
//! refresh and no stale-if-error: a failed fetch fails the current request
//! and leaves whatever was cached untouched.
//!
//! Concurrent misses on the same URL may both hit the network; the later
//! insert wins.

use crate::observability::metrics::{record_jwks_cache, record_jwks_fetch};
use common::jwk::JwkSet;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Default HTTP timeout for key-set fetches.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Failure to obtain a key set from the network.
#[derive(Debug, Error)]
pub enum JwksError {
    #[error("Key set request failed: {0}")]
    Transport(String),

    #[error("Key set endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Key set response could not be parsed: {0}")]
    Parse(String),
}

/// A fetched key set and when it was fetched. Replaced, never mutated.
struct CachedKeySet {
    key_set: Arc<JwkSet>,
    fetched_at: Instant,
}

pub struct JwksCache {
    http_client: reqwest::Client,
    entries: DashMap<String, CachedKeySet>,
    cache_ttl: Duration,
}

impl Default for JwksCache {
    fn default() -> Self {
        Self::new()
    }
}

impl JwksCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS))
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(cache_ttl: Duration) -> Self {
        Self::with_options(
            cache_ttl,
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
        )
    }

    /// Create a cache with a custom TTL and fetch timeout.
    pub fn with_options(cache_ttl: Duration, fetch_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "provider.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            http_client,
            entries: DashMap::new(),
            cache_ttl,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Get the key set published at `url`.
    ///
    /// Served from cache while the entry is younger than the TTL; otherwise
    /// fetched, cached and returned.
    ///
    /// # Errors
    ///
    /// Any transport failure, non-2xx status or unparseable body. The cache
    /// is left as it was.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<Arc<JwkSet>, JwksError> {
        if let Some(key_set) = self.fresh_entry(url, Instant::now()) {
            tracing::debug!(target: "provider.auth.jwks", "JWKS cache hit");
            record_jwks_cache("hit");
            return Ok(key_set);
        }

        record_jwks_cache("miss");

        let key_set = match self.fetch_remote(url).await {
            Ok(key_set) => {
                record_jwks_fetch("success");
                Arc::new(key_set)
            }
            Err(e) => {
                record_jwks_fetch("error");
                return Err(e);
            }
        };

        tracing::info!(
            target: "provider.auth.jwks",
            key_count = key_set.len(),
            "JWKS cache refreshed"
        );

        self.entries.insert(
            url.to_string(),
            CachedKeySet {
                key_set: Arc::clone(&key_set),
                fetched_at: Instant::now(),
            },
        );

        Ok(key_set)
    }

    /// Cached key set for `url` if it is still within the TTL at `now`.
    fn fresh_entry(&self, url: &str, now: Instant) -> Option<Arc<JwkSet>> {
        let entry = self.entries.get(url)?;
        if now.saturating_duration_since(entry.fetched_at) < self.cache_ttl {
            Some(Arc::clone(&entry.key_set))
        } else {
            None
        }
    }

    async fn fetch_remote(&self, url: &str) -> Result<JwkSet, JwksError> {
        tracing::debug!(target: "provider.auth.jwks", "Fetching JWKS");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            tracing::error!(target: "provider.auth.jwks", error = %e, "Failed to fetch JWKS");
            JwksError::Transport(e.to_string())
        })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "provider.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(JwksError::Status(response.status().as_u16()));
        }

        response.json::<JwkSet>().await.map_err(|e| {
            tracing::error!(target: "provider.auth.jwks", error = %e, "Failed to parse JWKS response");
            JwksError::Parse(e.to_string())
        })
    }
}
