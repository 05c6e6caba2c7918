//! In-memory cache implementation with TTL support

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::config::DEFAULT_MAX_VALUE_SIZE;
use super::error::{CacheError, CacheResult};
use super::key::CacheKey;
use super::provider::{CacheProvider, CacheStats};

/// Cache entry with value and expiration
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// In-memory cache stats (internal)
#[derive(Default)]
struct InMemoryStats {
    hits: u64,
    misses: u64,
    sets: u64,
    deletes: u64,
}

/// Thread-safe in-memory cache with TTL support.
///
/// # Stats Behavior
///
/// Statistics are updated after the primary operation completes and the
/// lock is released, so they may lag slightly under concurrent access.
///
/// # Eviction Behavior
///
/// When `max_entries` is reached, an arbitrary entry (first in `HashMap`
/// iteration order) is evicted. Not FIFO/LRU; query results here are cheap
/// to refetch, so predictable eviction order was not worth an ordered map.
#[derive(Clone)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
    stats: Arc<RwLock<InMemoryStats>>,
    max_entries: Option<usize>,
    max_value_size: usize,
    default_ttl: Option<Duration>,
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("max_entries", &self.max_entries)
            .field("max_value_size", &self.max_value_size)
            .field("default_ttl", &self.default_ttl)
            .field("entry_count", &self.store.read().len())
            .finish_non_exhaustive()
    }
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(InMemoryStats::default())),
            max_entries: None,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            default_ttl: None,
        }
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    #[must_use]
    pub const fn with_max_value_size(mut self, max: usize) -> Self {
        self.max_value_size = max;
        self
    }

    #[must_use]
    pub const fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Remove expired entries (called when a read observes an expiry)
    fn cleanup_expired(&self) {
        let mut store = self.store.write();
        store.retain(|_, entry| !entry.is_expired());
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheProvider for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        let key_str = key.to_key_string();
        let store = self.store.read();

        if let Some(entry) = store.get(&key_str) {
            if entry.is_expired() {
                drop(store);
                self.stats.write().misses += 1;
                self.cleanup_expired();
                return Ok(None);
            }
            let value = entry.value.clone();
            drop(store);
            self.stats.write().hits += 1;
            Ok(Some(value))
        } else {
            drop(store);
            self.stats.write().misses += 1;
            Ok(None)
        }
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        if value.len() > self.max_value_size {
            return Err(CacheError::ValueTooLarge {
                size: value.len(),
                max: self.max_value_size,
            });
        }

        let key_str = key.to_key_string();
        let effective_ttl = ttl.or(self.default_ttl);

        let entry = CacheEntry {
            value: value.to_vec(),
            expires_at: effective_ttl.map(|d| Instant::now() + d),
        };

        let mut store = self.store.write();

        // Evict if over limit (arbitrary eviction due to HashMap iteration order)
        if let Some(max) = self.max_entries
            && store.len() >= max
            && !store.contains_key(&key_str)
            && let Some(victim) = store.keys().next().cloned()
        {
            store.remove(&victim);
        }

        store.insert(key_str, entry);
        drop(store);

        self.stats.write().sets += 1;

        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<bool> {
        let key_str = key.to_key_string();
        let removed = self.store.write().remove(&key_str).is_some();

        if removed {
            self.stats.write().deletes += 1;
        }

        Ok(removed)
    }

    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut store = self.store.write();
        let before = store.len();
        store.retain(|k, _| !k.starts_with(prefix));
        let deleted = (before - store.len()) as u64;
        drop(store);

        if deleted > 0 {
            self.stats.write().deletes += deleted;
        }

        Ok(deleted)
    }

    async fn clear(&self) -> CacheResult<()> {
        self.store.write().clear();
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let stats = self.stats.read();
        let store = self.store.read();

        let size_bytes: u64 = store
            .values()
            .filter(|e| !e.is_expired())
            .map(|e| e.value.len() as u64)
            .sum();

        let entry_count = store.values().filter(|e| !e.is_expired()).count() as u64;
        drop(store);

        CacheStats {
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            deletes: stats.deletes,
            size_bytes: Some(size_bytes),
            entry_count: Some(entry_count),
        }
    }
}
