//! Cache configuration types

use std::str::FromStr;
use std::time::Duration;

/// Default maximum value size: 1MB
pub const DEFAULT_MAX_VALUE_SIZE: usize = 1_048_576;

/// Cache backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    #[default]
    Noop,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "memory" | "mem" => Self::Memory,
            _ => Self::Noop,
        })
    }
}

/// Time-to-live per query family.
///
/// Counts go stale fastest as snapshots churn; timespan definitions are
/// effectively immutable once a snapshot exists.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtlConfig {
    /// Fallback for entries with no family-specific TTL
    pub default: Duration,
    /// Media, story, word, focal-set, and sentence-sample listings
    pub lists: Duration,
    /// Story, sentence, and field counts
    pub counts: Duration,
    /// Timespan listings
    pub timespans: Duration,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(300),
            lists: Duration::from_secs(300),
            counts: Duration::from_secs(60),
            timespans: Duration::from_secs(3600),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Whether caching is enabled
    pub enabled: bool,
    /// Cache backend type
    pub backend: CacheBackend,
    /// TTL configuration
    pub ttl: CacheTtlConfig,
    /// Maximum entries for in-memory cache
    pub max_entries: Option<usize>,
    /// Maximum size of a single cached value in bytes (default: 1MB)
    pub max_value_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Memory,
            ttl: CacheTtlConfig::default(),
            max_entries: Some(10000),
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Memory,
            ttl: CacheTtlConfig {
                default: Duration::from_secs(300),
                lists: Duration::from_secs(300),
                counts: Duration::from_secs(60),
                timespans: Duration::from_secs(3600),
            },
            max_entries: Some(10000),
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_backend_from_str_memory() {
        assert_eq!(
            "memory".parse::<CacheBackend>().unwrap(),
            CacheBackend::Memory
        );
        assert_eq!("MEM".parse::<CacheBackend>().unwrap(), CacheBackend::Memory);
    }

    #[test]
    fn test_cache_backend_from_str_noop() {
        assert_eq!("noop".parse::<CacheBackend>().unwrap(), CacheBackend::Noop);
        assert_eq!("none".parse::<CacheBackend>().unwrap(), CacheBackend::Noop);
        assert_eq!(
            "disabled".parse::<CacheBackend>().unwrap(),
            CacheBackend::Noop
        );
    }

    #[test]
    fn test_cache_backend_from_str_unknown() {
        assert_eq!(
            "unknown".parse::<CacheBackend>().unwrap(),
            CacheBackend::Noop
        );
    }

    #[test]
    fn test_cache_ttl_config_default() {
        let ttl = CacheTtlConfig::default();
        assert_eq!(ttl.default, Duration::from_secs(300));
        assert_eq!(ttl.lists, Duration::from_secs(300));
        assert_eq!(ttl.counts, Duration::from_secs(60));
        assert_eq!(ttl.timespans, Duration::from_secs(3600));
    }

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.backend, CacheBackend::Memory);
        assert_eq!(config.max_entries, Some(10000));
        assert_eq!(config.max_value_size, DEFAULT_MAX_VALUE_SIZE);
    }

    #[test]
    fn test_cache_config_new_matches_default() {
        let config = CacheConfig::new();
        assert!(config.enabled);
        assert_eq!(config.backend, CacheBackend::Memory);
        assert_eq!(config.ttl.counts, Duration::from_secs(60));
    }

    #[test]
    fn test_default_max_value_size_is_1mb() {
        assert_eq!(DEFAULT_MAX_VALUE_SIZE, 1024 * 1024);
    }
}
