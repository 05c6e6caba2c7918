//! Cache provider trait definition

use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheResult;
use super::key::CacheKey;

/// Cache statistics for observability
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub size_bytes: Option<u64>,
    pub entry_count: Option<u64>,
}

/// Async cache provider trait.
///
/// Implementors store serialized query results. All operations are async so
/// network-backed implementations can slot in without touching callers.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Get a value from cache by key
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value in cache with optional TTL
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> CacheResult<()>;

    /// Delete a key from cache
    async fn delete(&self, key: &CacheKey) -> CacheResult<bool>;

    /// Delete all keys under a namespace/scope prefix
    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<u64>;

    /// Clear entire cache (use with caution)
    async fn clear(&self) -> CacheResult<()>;

    /// Health check for the cache backend
    async fn health_check(&self) -> CacheResult<()>;

    /// Get cache statistics for observability
    async fn stats(&self) -> CacheStats;
}
