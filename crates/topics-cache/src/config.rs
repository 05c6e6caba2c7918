//! Configuration management
//!
//! Supports configuration loading with precedence: env > file > defaults

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::cache::{CacheBackend, CacheConfig};
use crate::constants::STORY_UNDATEABLE_TAG;
use crate::error::{Error, Result};

/// Environment variable names
mod vars {
    pub const CONFIG_FILE: &str = "TOPICS_CONFIG";
    pub const API_URL: &str = "TOPICS_API_URL";
    pub const TOOL_API_KEY: &str = "TOPICS_TOOL_API_KEY";
    pub const REQUEST_TIMEOUT_SECS: &str = "TOPICS_REQUEST_TIMEOUT_SECS";
    pub const CACHE_ENABLED: &str = "TOPICS_CACHE_ENABLED";
    pub const CACHE_BACKEND: &str = "TOPICS_CACHE_BACKEND";
    pub const CACHE_MAX_ENTRIES: &str = "TOPICS_CACHE_MAX_ENTRIES";
    pub const CACHE_TTL_SECS: &str = "TOPICS_CACHE_TTL_SECS";
    pub const UNDATEABLE_TAG: &str = "TOPICS_UNDATEABLE_TAG";
}

/// Default config file name looked up in the working directory
const DEFAULT_CONFIG_FILE: &str = "topics-cache.toml";

/// Upstream API connection settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub tool_api_key: String,
    pub request_timeout: Duration,
}

/// Facade configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub undateable_tag_id: i64,
}

impl Config {
    #[must_use]
    pub const fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Configuration builder with fluent API
#[derive(Debug)]
pub struct ConfigBuilder {
    base_url: Option<Url>,
    tool_api_key: Option<String>,
    request_timeout: Duration,
    cache: CacheConfig,
    undateable_tag_id: i64,
}

impl ConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base_url: None,
            tool_api_key: None,
            request_timeout: Duration::from_secs(30),
            cache: CacheConfig::new(),
            undateable_tag_id: STORY_UNDATEABLE_TAG,
        }
    }

    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    #[must_use]
    pub fn tool_api_key(mut self, key: impl Into<String>) -> Self {
        self.tool_api_key = Some(key.into());
        self
    }

    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache.enabled = enabled;
        self
    }

    #[must_use]
    pub const fn cache_backend(mut self, backend: CacheBackend) -> Self {
        self.cache.backend = backend;
        self
    }

    #[must_use]
    pub const fn cache_max_entries(mut self, max: Option<usize>) -> Self {
        self.cache.max_entries = max;
        self
    }

    /// Set the fallback TTL applied to entries with no family-specific TTL
    #[must_use]
    pub const fn cache_default_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl.default = ttl;
        self
    }

    #[must_use]
    pub const fn undateable_tag_id(mut self, tags_id: i64) -> Self {
        self.undateable_tag_id = tags_id;
        self
    }

    pub fn build(self) -> Result<Config> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("API base URL is required".to_string()))?;
        let tool_api_key = self
            .tool_api_key
            .ok_or_else(|| Error::Config("Tool API key is required".to_string()))?;

        Ok(Config {
            api: ApiConfig {
                base_url,
                tool_api_key,
                request_timeout: self.request_timeout,
            },
            cache: self.cache,
            undateable_tag_id: self.undateable_tag_id,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// TOML file schema; every field optional so partial files compose with
/// env overrides and defaults
#[derive(Debug, Deserialize)]
struct FileConfig {
    api: Option<FileApiSection>,
    cache: Option<FileCacheSection>,
    tags: Option<FileTagsSection>,
}

#[derive(Debug, Deserialize)]
struct FileApiSection {
    base_url: Option<String>,
    tool_api_key: Option<String>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileCacheSection {
    enabled: Option<bool>,
    backend: Option<String>,
    max_entries: Option<usize>,
    ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileTagsSection {
    undateable: Option<i64>,
}

/// Load configuration with precedence: env > file > defaults
pub fn load_config() -> Result<ConfigBuilder> {
    let mut builder = ConfigBuilder::new();

    if let Some(path) = find_config_file() {
        tracing::info!("Loading configuration from {}", path.display());
        builder = load_from_file(&path, builder)?;
    }

    load_from_env(builder)
}

/// Load configuration from a specific file path, then apply env overrides
pub fn load_config_from_path(path: &Path) -> Result<ConfigBuilder> {
    let builder = load_from_file(path, ConfigBuilder::new())?;
    load_from_env(builder)
}

fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = env::var(vars::CONFIG_FILE) {
        return Some(PathBuf::from(path));
    }

    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

fn load_from_file(path: &Path, mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
    let parsed: FileConfig = toml::from_str(&raw)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {e}", path.display())))?;

    if let Some(api) = parsed.api {
        if let Some(url_str) = api.base_url {
            let url = Url::parse(&url_str)
                .map_err(|e| Error::Config(format!("Invalid api.base_url: {e}")))?;
            builder = builder.base_url(url);
        }
        if let Some(key) = api.tool_api_key {
            builder = builder.tool_api_key(key);
        }
        if let Some(secs) = api.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
    }

    if let Some(cache) = parsed.cache {
        if let Some(enabled) = cache.enabled {
            builder = builder.cache_enabled(enabled);
        }
        if let Some(backend) = cache.backend {
            builder = builder.cache_backend(backend.parse().unwrap_or_default());
        }
        if let Some(max) = cache.max_entries {
            builder = builder.cache_max_entries(Some(max));
        }
        if let Some(secs) = cache.ttl_secs {
            builder = builder.cache_default_ttl(Duration::from_secs(secs));
        }
    }

    if let Some(tags) = parsed.tags
        && let Some(tags_id) = tags.undateable
    {
        builder = builder.undateable_tag_id(tags_id);
    }

    Ok(builder)
}

/// Load configuration from environment variables
fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Ok(url_str) = env::var(vars::API_URL) {
        let url = Url::parse(&url_str)
            .map_err(|e| Error::Config(format!("Invalid {}: {e}", vars::API_URL)))?;
        builder = builder.base_url(url);
    }

    if let Ok(key) = env::var(vars::TOOL_API_KEY) {
        builder = builder.tool_api_key(key);
    }

    if let Ok(timeout_str) = env::var(vars::REQUEST_TIMEOUT_SECS)
        && let Ok(secs) = timeout_str.parse::<u64>()
    {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }

    if let Ok(val) = env::var(vars::CACHE_ENABLED) {
        builder = builder.cache_enabled(parse_bool(&val));
    }

    if let Ok(backend) = env::var(vars::CACHE_BACKEND) {
        builder = builder.cache_backend(backend.parse().unwrap_or_default());
    }

    if let Ok(max_str) = env::var(vars::CACHE_MAX_ENTRIES)
        && let Ok(max) = max_str.parse::<usize>()
    {
        builder = builder.cache_max_entries(Some(max));
    }

    if let Ok(ttl_str) = env::var(vars::CACHE_TTL_SECS)
        && let Ok(secs) = ttl_str.parse::<u64>()
    {
        builder = builder.cache_default_ttl(Duration::from_secs(secs));
    }

    if let Ok(tag_str) = env::var(vars::UNDATEABLE_TAG)
        && let Ok(tags_id) = tag_str.parse::<i64>()
    {
        builder = builder.undateable_tag_id(tags_id);
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use super::*;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_MUTEX.lock().unwrap();

        let old_values: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();

        for (key, value) in vars {
            // SAFETY: We hold a mutex lock to ensure no concurrent modifications
            unsafe { env::set_var(key, value) };
        }

        let result = f();

        for (key, old_value) in old_values {
            match old_value {
                // SAFETY: We hold a mutex lock to ensure no concurrent modifications
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }

        result
    }

    #[test]
    fn test_builder_defaults() {
        let builder = ConfigBuilder::new();
        assert_eq!(builder.request_timeout, Duration::from_secs(30));
        assert_eq!(builder.undateable_tag_id, STORY_UNDATEABLE_TAG);
        assert!(builder.cache.enabled);
    }

    #[test]
    fn test_build_requires_base_url() {
        let err = ConfigBuilder::new()
            .tool_api_key("key")
            .build()
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("base URL"));
    }

    #[test]
    fn test_build_requires_tool_api_key() {
        let err = ConfigBuilder::new()
            .base_url(Url::parse("https://analytics.example.org/api/v2/").unwrap())
            .build()
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_build_complete() {
        let config = ConfigBuilder::new()
            .base_url(Url::parse("https://analytics.example.org/api/v2/").unwrap())
            .tool_api_key("tool-key")
            .request_timeout(Duration::from_secs(5))
            .undateable_tag_id(99)
            .build()
            .unwrap();

        assert_eq!(config.api.tool_api_key, "tool-key");
        assert_eq!(config.api.request_timeout, Duration::from_secs(5));
        assert_eq!(config.undateable_tag_id, 99);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[api]
base_url = "https://analytics.example.org/api/v2/"
tool_api_key = "file-key"
request_timeout_secs = 12

[cache]
enabled = true
backend = "memory"
max_entries = 500
ttl_secs = 120

[tags]
undateable = 777
"#
        )
        .unwrap();

        let config = load_from_file(file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.api.tool_api_key, "file-key");
        assert_eq!(config.api.request_timeout, Duration::from_secs(12));
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.max_entries, Some(500));
        assert_eq!(config.cache.ttl.default, Duration::from_secs(120));
        assert_eq!(config.undateable_tag_id, 777);
    }

    #[test]
    fn test_load_from_file_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[cache]
enabled = false
"#
        )
        .unwrap();

        let builder = load_from_file(file.path(), ConfigBuilder::new()).unwrap();
        assert!(!builder.cache.enabled);
        assert!(builder.base_url.is_none());
    }

    #[test]
    fn test_load_from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not [valid toml").unwrap();

        let err = load_from_file(file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_load_from_file_rejects_bad_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[api]
base_url = "not a url"
"#
        )
        .unwrap();

        let err = load_from_file(file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_env_overrides() {
        let config = with_env_vars(
            &[
                ("TOPICS_API_URL", "https://env.example.org/api/v2/"),
                ("TOPICS_TOOL_API_KEY", "env-key"),
                ("TOPICS_REQUEST_TIMEOUT_SECS", "7"),
                ("TOPICS_CACHE_BACKEND", "noop"),
                ("TOPICS_CACHE_MAX_ENTRIES", "42"),
                ("TOPICS_UNDATEABLE_TAG", "123"),
            ],
            || load_from_env(ConfigBuilder::new()).unwrap().build().unwrap(),
        );

        assert_eq!(config.api.base_url.as_str(), "https://env.example.org/api/v2/");
        assert_eq!(config.api.tool_api_key, "env-key");
        assert_eq!(config.api.request_timeout, Duration::from_secs(7));
        assert_eq!(config.cache.backend, CacheBackend::Noop);
        assert_eq!(config.cache.max_entries, Some(42));
        assert_eq!(config.undateable_tag_id, 123);
    }

    #[test]
    fn test_env_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[api]
base_url = "https://file.example.org/api/v2/"
tool_api_key = "file-key"
"#
        )
        .unwrap();

        let config = with_env_vars(&[("TOPICS_TOOL_API_KEY", "env-key")], || {
            load_config_from_path(file.path()).unwrap().build().unwrap()
        });

        assert_eq!(config.api.base_url.as_str(), "https://file.example.org/api/v2/");
        assert_eq!(config.api.tool_api_key, "env-key");
    }

    #[test]
    fn test_env_invalid_url_is_an_error() {
        let result = with_env_vars(&[("TOPICS_API_URL", "::::")], || {
            load_from_env(ConfigBuilder::new())
        });
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(parse_bool("YES"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }
}
