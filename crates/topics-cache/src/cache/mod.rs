//! Cache abstraction for topic query results
//!
//! Provides pluggable cache backends with a unified async interface and the
//! [`cached_or_fetch`] helper every facade entry point goes through.
//!
//! # Available Backends
//!
//! - [`NoopCache`] - No-op implementation (caching disabled)
//! - [`InMemoryCache`] - Thread-safe in-memory cache with TTL support
//!
//! # Observability
//!
//! Wrap any cache with [`TracedCache`] to add tracing spans and logging.
//!
//! # Per-Credential Isolation
//!
//! Every key carries the calling credential's scope (the shared tool key or
//! a per-user key digest), so:
//!
//! - a user's cached result is never served to another user
//! - tool-credential results and user-credential results never mix
//!
//! # Failure Semantics
//!
//! The cache is an optimization, never a source of truth: lookup, decode,
//! and store failures are logged and the call falls through to a fresh
//! upstream fetch. Only the upstream call itself can fail a query.

mod config;
mod error;
mod key;
mod memory;
mod noop;
mod provider;
mod traced;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{CacheBackend, CacheConfig, CacheTtlConfig, DEFAULT_MAX_VALUE_SIZE};
pub use error::{CacheError, CacheResult};
pub use key::{CacheKey, CacheNamespace};
pub use memory::InMemoryCache;
pub use noop::NoopCache;
pub use provider::{CacheProvider, CacheStats};
pub use traced::TracedCache;

/// Create a cache provider based on configuration
#[must_use]
pub fn create_cache(config: &CacheConfig) -> Arc<dyn CacheProvider> {
    if !config.enabled {
        return Arc::new(NoopCache::new());
    }

    match config.backend {
        CacheBackend::Noop => Arc::new(NoopCache::new()),
        CacheBackend::Memory => {
            let mut cache = InMemoryCache::new()
                .with_default_ttl(config.ttl.default)
                .with_max_value_size(config.max_value_size);

            if let Some(max) = config.max_entries {
                cache = cache.with_max_entries(max);
            }

            Arc::new(TracedCache::new(cache))
        }
    }
}

/// Return the cached value for `key`, or compute it via `fetch` and store
/// the result.
///
/// This is the explicit key-plus-compute form of memoization: the caller
/// builds the key (credential scope and effective arguments included) and
/// supplies the upstream computation. Cache failures never propagate -
/// always fall back to the fetch.
pub async fn cached_or_fetch<T, F, Fut>(
    cache: &dyn CacheProvider,
    key: &CacheKey,
    ttl: Duration,
    fetch: F,
) -> crate::Result<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = crate::Result<T>>,
{
    // 1. Try cache first
    match cache.get(key).await {
        Ok(Some(data)) => match serde_json::from_slice::<T>(&data) {
            Ok(value) => {
                tracing::debug!(
                    cache.result = "hit",
                    cache.key = %key,
                    "Returning cached value"
                );
                return Ok(value);
            }
            Err(e) => {
                tracing::warn!(
                    cache.key = %key,
                    error = %e,
                    "Cache deserialization failed, fetching from upstream"
                );
            }
        },
        Ok(None) => {
            tracing::debug!(
                cache.result = "miss",
                cache.key = %key,
                "Cache miss, fetching from upstream"
            );
        }
        Err(e) => {
            tracing::warn!(
                cache.key = %key,
                error = %e,
                "Cache get failed, fetching from upstream"
            );
        }
    }

    // 2. Fetch from upstream
    let value = fetch().await?;

    // 3. Store in cache (errors logged but not propagated)
    match serde_json::to_vec(&value) {
        Ok(data) => {
            if let Err(e) = cache.set(key, &data, Some(ttl)).await {
                tracing::warn!(
                    cache.key = %key,
                    error = %e,
                    "Failed to cache value"
                );
            }
        }
        Err(e) => {
            tracing::warn!(
                cache.key = %key,
                error = %e,
                "Failed to serialize value for caching"
            );
        }
    }

    Ok(value)
}
