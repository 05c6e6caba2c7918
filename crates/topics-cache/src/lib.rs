//! Caching query facade over a remote topic-analytics API
//!
//! Sits between an HTTP handler layer and the upstream analytics service:
//! extracts filter parameters from the request, merges caller overrides on
//! top (override wins), and memoizes each upstream call under a key built
//! from the query family, the calling credential, and the effective
//! arguments. See [`TopicQueryCache`] for the entry points.
//!
//! This layer adds no resilience: upstream failures propagate verbatim, and
//! the cache degrades to a fetch when it misbehaves.

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
mod constants;
mod error;
mod facade;
pub mod query;
pub mod types;

pub use auth::{AccessControl, Credential, Session};
pub use cache::{
    CacheBackend, CacheConfig, CacheError, CacheKey, CacheNamespace, CacheProvider, CacheResult,
    CacheStats, CacheTtlConfig, InMemoryCache, NoopCache, TracedCache, cached_or_fetch,
    create_cache,
};
pub use client::{
    ClientProvider, HttpClientProvider, HttpTopicsClient, TimespanFilter, TopicsApi,
};
pub use config::{ApiConfig, Config, ConfigBuilder, load_config, load_config_from_path};
pub use constants::{DEFAULT_SAMPLE_SIZE, STORY_UNDATEABLE_TAG};
pub use error::{Error, Result};
pub use facade::TopicQueryCache;
pub use query::{FilterSet, QuerySpec, RequestParams};
pub use types::{FieldCount, StoryCount, TagCoverage, Timespan};
