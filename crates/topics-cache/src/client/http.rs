//! HTTP implementation of the upstream API client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{ClientProvider, TimespanFilter, TopicsApi};
use crate::auth::Credential;
use crate::error::{Error, Result};
use crate::query::QuerySpec;
use crate::types::{FieldCount, StoryCount, Timespan};

/// Some deployments wrap list payloads in an envelope object, others return
/// the bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimespanListResponse {
    Wrapped { timespans: Vec<Timespan> },
    Bare(Vec<Timespan>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldCountResponse {
    Wrapped { counts: Vec<FieldCount> },
    Bare(Vec<FieldCount>),
}

/// Upstream client bound to one API key.
///
/// Cheap to construct: the underlying `reqwest::Client` connection pool is
/// shared, only the key differs per credential.
#[derive(Clone)]
pub struct HttpTopicsClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for HttpTopicsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTopicsClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpTopicsClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: ensure_trailing_slash(base_url),
            api_key: api_key.into(),
        }
    }

    async fn get_json(&self, path: &str, pairs: &[(&str, String)]) -> Result<Value> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid endpoint path {path}: {e}")))?;

        tracing::debug!(api.path = path, "Upstream request");

        let response = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .query(pairs)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

/// `Url::join` treats a path without a trailing slash as a file and would
/// drop its last segment
fn ensure_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

#[async_trait]
impl TopicsApi for HttpTopicsClient {
    async fn media_list(&self, topics_id: i64, query: &QuerySpec) -> Result<Value> {
        self.get_json(
            &format!("topics/{topics_id}/media/list"),
            &query.to_query_pairs(),
        )
        .await
    }

    async fn story_list(&self, topics_id: i64, query: &QuerySpec) -> Result<Value> {
        self.get_json(
            &format!("topics/{topics_id}/stories/list"),
            &query.to_query_pairs(),
        )
        .await
    }

    async fn story_count(&self, topics_id: i64, query: &QuerySpec) -> Result<StoryCount> {
        let value = self
            .get_json(
                &format!("topics/{topics_id}/stories/count"),
                &query.to_query_pairs(),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn word_count(&self, topics_id: i64, query: &QuerySpec) -> Result<Value> {
        self.get_json(
            &format!("topics/{topics_id}/wc/list"),
            &query.to_query_pairs(),
        )
        .await
    }

    async fn sentence_count(&self, topics_id: i64, query: &QuerySpec) -> Result<Value> {
        self.get_json(
            &format!("topics/{topics_id}/sentences/count"),
            &query.to_query_pairs(),
        )
        .await
    }

    async fn focal_set_list(&self, topics_id: i64, snapshots_id: Option<i64>) -> Result<Value> {
        let mut pairs = Vec::new();
        if let Some(id) = snapshots_id {
            pairs.push(("snapshots_id", id.to_string()));
        }
        self.get_json(&format!("topics/{topics_id}/focal_sets/list"), &pairs)
            .await
    }

    async fn timespan_list(
        &self,
        topics_id: i64,
        filter: &TimespanFilter,
    ) -> Result<Vec<Timespan>> {
        let mut pairs = Vec::new();
        if let Some(id) = filter.snapshots_id {
            pairs.push(("snapshots_id", id.to_string()));
        }
        if let Some(id) = filter.foci_id {
            pairs.push(("foci_id", id.to_string()));
        }
        if let Some(id) = filter.timespans_id {
            pairs.push(("timespans_id", id.to_string()));
        }

        let value = self
            .get_json(&format!("topics/{topics_id}/timespans/list"), &pairs)
            .await?;

        match serde_json::from_value(value)? {
            TimespanListResponse::Wrapped { timespans } | TimespanListResponse::Bare(timespans) => {
                Ok(timespans)
            }
        }
    }

    async fn sentence_list(
        &self,
        q: Option<&str>,
        fq: Option<&str>,
        rows: u32,
        random_sort: bool,
    ) -> Result<Value> {
        let mut pairs = Vec::new();
        if let Some(q) = q {
            pairs.push(("q", q.to_string()));
        }
        if let Some(fq) = fq {
            pairs.push(("fq", fq.to_string()));
        }
        pairs.push(("rows", rows.to_string()));
        if random_sort {
            pairs.push(("sort", "random".to_string()));
        }

        self.get_json("sentences/list", &pairs).await
    }

    async fn sentence_field_count(
        &self,
        q: &str,
        fq: Option<&str>,
        field: &str,
        tag_sets_id: i64,
        sample_size: u32,
    ) -> Result<Vec<FieldCount>> {
        let mut pairs = vec![("q", q.to_string())];
        if let Some(fq) = fq {
            pairs.push(("fq", fq.to_string()));
        }
        pairs.push(("field", field.to_string()));
        pairs.push(("tag_sets_id", tag_sets_id.to_string()));
        pairs.push(("sample_size", sample_size.to_string()));

        let value = self.get_json("sentences/field_count", &pairs).await?;

        match serde_json::from_value(value)? {
            FieldCountResponse::Wrapped { counts } | FieldCountResponse::Bare(counts) => Ok(counts),
        }
    }
}

/// Builds per-credential [`HttpTopicsClient`] instances over one shared
/// connection pool
pub struct HttpClientProvider {
    http: reqwest::Client,
    base_url: Url,
    tool_api_key: String,
}

impl std::fmt::Debug for HttpClientProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClientProvider")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpClientProvider {
    pub fn new(
        base_url: Url,
        tool_api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: ensure_trailing_slash(base_url),
            tool_api_key: tool_api_key.into(),
        })
    }
}

impl ClientProvider for HttpClientProvider {
    fn client_for(&self, credential: &Credential) -> Arc<dyn TopicsApi> {
        let api_key = match credential {
            Credential::Tool => self.tool_api_key.clone(),
            Credential::User(key) => key.clone(),
        };
        Arc::new(HttpTopicsClient::new(
            self.http.clone(),
            self.base_url.clone(),
            api_key,
        ))
    }
}
