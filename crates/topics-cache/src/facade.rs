//! Cached query entry points
//!
//! One public method per query family. Every method follows the same shape:
//! merge the ambient request parameters with explicit overrides (override
//! wins), build a cache key carrying the credential scope, and return the
//! cached value or delegate to the client selected for the credential.
//! Upstream failures propagate untouched; cache failures degrade to a fetch.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{AccessControl, Credential, Session};
use crate::cache::{
    CacheKey, CacheNamespace, CacheProvider, CacheTtlConfig, cached_or_fetch, create_cache,
};
use crate::client::{ClientProvider, HttpClientProvider, TimespanFilter, TopicsApi};
use crate::config::Config;
use crate::constants::{
    DATE_PREFIX_LEN, DEFAULT_SAMPLE_SIZE, FIELD_TAGS_ID_STORIES, STORY_UNDATEABLE_TAG,
};
use crate::error::{Error, Result};
use crate::query::{QuerySpec, RequestParams};
use crate::types::{FieldCount, StoryCount, TagCoverage, Timespan};

/// Caching facade over the upstream topic-analytics API.
///
/// Collaborators are injected; this type owns no ambient state beyond its
/// TTL table and the undateable-tag id.
pub struct TopicQueryCache {
    clients: Arc<dyn ClientProvider>,
    cache: Arc<dyn CacheProvider>,
    access: Arc<dyn AccessControl>,
    ttl: CacheTtlConfig,
    undateable_tag_id: i64,
}

impl std::fmt::Debug for TopicQueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicQueryCache")
            .field("ttl", &self.ttl)
            .field("undateable_tag_id", &self.undateable_tag_id)
            .finish_non_exhaustive()
    }
}

impl TopicQueryCache {
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientProvider>,
        cache: Arc<dyn CacheProvider>,
        access: Arc<dyn AccessControl>,
    ) -> Self {
        Self {
            clients,
            cache,
            access,
            ttl: CacheTtlConfig::default(),
            undateable_tag_id: STORY_UNDATEABLE_TAG,
        }
    }

    /// Wire up an HTTP client provider and cache backend from configuration
    pub fn from_config(config: &Config, access: Arc<dyn AccessControl>) -> Result<Self> {
        let clients = HttpClientProvider::new(
            config.api.base_url.clone(),
            config.api.tool_api_key.clone(),
            config.api.request_timeout,
        )?;
        let cache = create_cache(&config.cache);

        Ok(Self {
            clients: Arc::new(clients),
            cache,
            access,
            ttl: config.cache.ttl,
            undateable_tag_id: config.undateable_tag_id,
        })
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: CacheTtlConfig) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub const fn with_undateable_tag(mut self, tags_id: i64) -> Self {
        self.undateable_tag_id = tags_id;
        self
    }

    /// Shared merge-key-fetch path for per-topic queries
    async fn cached_call<T, F, Fut>(
        &self,
        namespace: CacheNamespace,
        ttl: Duration,
        credential: &Credential,
        topics_id: i64,
        merged: QuerySpec,
        call: F,
    ) -> Result<T>
    where
        T: Serialize + for<'de> Deserialize<'de>,
        F: FnOnce(Arc<dyn TopicsApi>, QuerySpec) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let scope = credential.cache_scope();
        let key = CacheKey::topic_query(namespace, &scope, topics_id, &merged);
        let client = self.clients.client_for(credential);

        cached_or_fetch(self.cache.as_ref(), &key, ttl, || call(client, merged)).await
    }

    /// Sorted media list based on the request filters
    pub async fn media_list(
        &self,
        credential: &Credential,
        topics_id: i64,
        request: &RequestParams,
        overrides: &QuerySpec,
    ) -> Result<Value> {
        let merged = QuerySpec::from_request(request).merge(overrides);
        self.cached_call(
            CacheNamespace::MediaList,
            self.ttl.lists,
            credential,
            topics_id,
            merged,
            |client, q| async move { client.media_list(topics_id, &q).await },
        )
        .await
    }

    /// Filtered story count within a topic
    pub async fn story_count(
        &self,
        credential: &Credential,
        topics_id: i64,
        request: &RequestParams,
        overrides: &QuerySpec,
    ) -> Result<StoryCount> {
        let merged = QuerySpec::from_filters(&request.filters).merge(overrides);
        self.cached_call(
            CacheNamespace::StoryCount,
            self.ttl.counts,
            credential,
            topics_id,
            merged,
            |client, q| async move { client.story_count(topics_id, &q).await },
        )
        .await
    }

    /// Sorted story list based on the request filters
    pub async fn story_list(
        &self,
        credential: &Credential,
        topics_id: i64,
        request: &RequestParams,
        overrides: &QuerySpec,
    ) -> Result<Value> {
        let merged = QuerySpec::from_request(request).merge(overrides);
        self.cached_call(
            CacheNamespace::StoryList,
            self.ttl.lists,
            credential,
            topics_id,
            merged,
            |client, q| async move { client.story_list(topics_id, &q).await },
        )
        .await
    }

    /// Sampled word counts based on the request filters
    pub async fn word_counts(
        &self,
        credential: &Credential,
        topics_id: i64,
        request: &RequestParams,
        overrides: &QuerySpec,
    ) -> Result<Value> {
        let base = QuerySpec {
            sample_size: Some(DEFAULT_SAMPLE_SIZE),
            ..QuerySpec::from_filters(&request.filters)
        };
        let merged = base.merge(overrides);
        self.cached_call(
            CacheNamespace::WordCount,
            self.ttl.lists,
            credential,
            topics_id,
            merged,
            |client, q| async move { client.word_count(topics_id, &q).await },
        )
        .await
    }

    /// Sentence counts over time, excluding undateable stories.
    ///
    /// The effective query is amended before keying, so the cache sees the
    /// query actually sent upstream. The count call needs the timespan's
    /// date range, so the cached computation looks the timespan up first.
    pub async fn sentence_counts(
        &self,
        credential: &Credential,
        topics_id: i64,
        request: &RequestParams,
        overrides: &QuerySpec,
    ) -> Result<Value> {
        let mut merged = QuerySpec::from_filters(&request.filters).merge(overrides);
        merged.q = Some(undateable_guard(
            merged.q.as_deref(),
            self.undateable_tag_id,
        ));

        self.cached_call(
            CacheNamespace::SentenceCount,
            self.ttl.counts,
            credential,
            topics_id,
            merged,
            |client, q| async move {
                let filter = TimespanFilter {
                    snapshots_id: q.snapshots_id,
                    foci_id: q.foci_id,
                    timespans_id: q.timespans_id,
                };
                let timespans = client.timespan_list(topics_id, &filter).await?;
                let Some(timespan) = timespans.first() else {
                    return Err(Error::NoTimespans { topics_id });
                };

                let mut call = q.clone();
                call.split = Some(true);
                call.split_start_date = Some(date_prefix(&timespan.start_date).to_string());
                call.split_end_date = Some(date_prefix(&timespan.end_date).to_string());
                client.sentence_count(topics_id, &call).await
            },
        )
        .await
    }

    /// Random sample of sentences matching the filters
    pub async fn sentence_sample(
        &self,
        credential: &Credential,
        topics_id: i64,
        sample_size: u32,
        request: &RequestParams,
        overrides: &QuerySpec,
    ) -> Result<Value> {
        let merged = QuerySpec::from_filters(&request.filters).merge(overrides);
        let scope = credential.cache_scope();
        let key = CacheKey::sentence_sample(&scope, topics_id, sample_size, &merged);
        let client = self.clients.client_for(credential);

        cached_or_fetch(self.cache.as_ref(), &key, self.ttl.lists, || async move {
            let fq = merged.timespans_id.map(|id| format!("timespans_id:{id}"));
            client
                .sentence_list(merged.q.as_deref(), fq.as_deref(), sample_size, true)
                .await
        })
        .await
    }

    /// Focal sets defined for a snapshot of a topic
    pub async fn focal_sets(
        &self,
        credential: &Credential,
        topics_id: i64,
        snapshots_id: Option<i64>,
    ) -> Result<Value> {
        let scope = credential.cache_scope();
        let key = CacheKey::focal_sets(&scope, topics_id, snapshots_id);
        let client = self.clients.client_for(credential);

        cached_or_fetch(self.cache.as_ref(), &key, self.ttl.lists, || async move {
            client.focal_set_list(topics_id, snapshots_id).await
        })
        .await
    }

    /// Timespans defined for a snapshot of a topic
    pub async fn timespan_list(
        &self,
        credential: &Credential,
        topics_id: i64,
        snapshots_id: Option<i64>,
        foci_id: Option<i64>,
    ) -> Result<Vec<Timespan>> {
        let scope = credential.cache_scope();
        let key = CacheKey::timespan_list(&scope, topics_id, snapshots_id, foci_id);
        let client = self.clients.client_for(credential);

        cached_or_fetch(
            self.cache.as_ref(),
            &key,
            self.ttl.timespans,
            || async move {
                let filter = TimespanFilter {
                    snapshots_id,
                    foci_id,
                    timespans_id: None,
                };
                client.timespan_list(topics_id, &filter).await
            },
        )
        .await
    }

    /// Look up a single timespan by id.
    ///
    /// Upstream only lists timespans, so this fetches the list through the
    /// cache and scans for the integer-coerced requested id. An unknown or
    /// unparseable id is "not found", not an error.
    pub async fn timespan(
        &self,
        credential: &Credential,
        topics_id: i64,
        snapshots_id: Option<i64>,
        foci_id: Option<i64>,
        timespans_id: &str,
    ) -> Result<Option<Timespan>> {
        let Ok(wanted) = timespans_id.trim().parse::<i64>() else {
            return Ok(None);
        };

        let timespans = self
            .timespan_list(credential, topics_id, snapshots_id, foci_id)
            .await?;

        Ok(timespans.into_iter().find(|t| t.timespans_id == wanted))
    }

    /// Most-used tags within a tag set for a single timespan.
    ///
    /// Each row gains `pct`, its share of the sample, so callers can show
    /// relative values; upstream reports absolute counts only.
    pub async fn tag_counts(
        &self,
        credential: &Credential,
        timespans_id: Option<i64>,
        tag_sets_id: i64,
        sample_size: u32,
    ) -> Result<Vec<FieldCount>> {
        let scope = credential.cache_scope();
        let key = CacheKey::field_count(&scope, timespans_id, tag_sets_id, sample_size);
        let client = self.clients.client_for(credential);

        cached_or_fetch(self.cache.as_ref(), &key, self.ttl.counts, || async move {
            let fq = timespans_id.map(|id| format!("timespans_id:{id}"));
            let mut rows = client
                .sentence_field_count(
                    "*",
                    fq.as_deref(),
                    FIELD_TAGS_ID_STORIES,
                    tag_sets_id,
                    sample_size,
                )
                .await?;

            for row in &mut rows {
                row.pct = Some(row.count as f64 / f64::from(sample_size));
            }

            Ok(rows)
        })
        .await
    }

    /// How many stories under the current filters carry a given tag.
    ///
    /// Runs under the tool credential for public topics, the session's user
    /// credential otherwise. An anonymous caller on a private topic gets
    /// `Ok(None)` - no access is an absent result, not a zero count.
    pub async fn tag_coverage(
        &self,
        session: &Session,
        topics_id: i64,
        tags_id: i64,
        request: &RequestParams,
    ) -> Result<Option<TagCoverage>> {
        let query_with_tag = compose_tag_query(request.filters.q.as_deref(), tags_id);

        let credential = if self.access.topic_is_public(topics_id).await? {
            Credential::Tool
        } else if let Some(user) = session.credential() {
            user.clone()
        } else {
            tracing::debug!(topic = topics_id, "Tag coverage denied: private topic, anonymous caller");
            return Ok(None);
        };

        let total = self
            .story_count(&credential, topics_id, request, &QuerySpec::default())
            .await?;
        let tagged = self
            .story_count(
                &credential,
                topics_id,
                request,
                &QuerySpec {
                    q: Some(query_with_tag),
                    ..QuerySpec::default()
                },
            )
            .await?;

        Ok(Some(TagCoverage {
            count: tagged.count,
            total: total.count,
        }))
    }
}

/// Amend a query to exclude stories tagged as undateable.
///
/// Plain concatenation, no grouping around the caller's clause; a caller
/// query with a top-level OR binds wrong here.
/// TODO: wrap the caller clause in parens once existing saved queries are
/// audited for the changed semantics.
fn undateable_guard(q: Option<&str>, undateable_tag_id: i64) -> String {
    let guard = format!("NOT tags_id_stories:{undateable_tag_id}");
    match q {
        Some(q) => format!("{q} AND {guard}"),
        None => format!("* AND {guard}"),
    }
}

/// Restrict a query to stories carrying `tags_id`; both sides grouped
fn compose_tag_query(q: Option<&str>, tags_id: i64) -> String {
    let tag_query = format!("tags_id_stories:{tags_id}");
    match q {
        Some(q) => format!("({q}) AND ({tag_query})"),
        None => tag_query,
    }
}

/// Upstream timestamps are `YYYY-MM-DD HH:MM:SS`; split boundaries take the
/// date only
fn date_prefix(date: &str) -> &str {
    date.get(..DATE_PREFIX_LEN).unwrap_or(date)
}
