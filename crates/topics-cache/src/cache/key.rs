//! Cache key types and factory methods
//!
//! A key is `namespace : scope : resource : fingerprint`: the query family,
//! the credential scope (see [`crate::Credential::cache_scope`]), the topic
//! the query targets, and a digest of the effective merged arguments. Two
//! calls with the same credential and the same effective arguments land on
//! the same entry; any difference in credential or arguments lands elsewhere.

use std::fmt;

use crate::query::QuerySpec;

/// Cache key namespace, one per query family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    MediaList,
    StoryList,
    StoryCount,
    WordCount,
    SentenceCount,
    SentenceSample,
    FocalSetList,
    TimespanList,
    FieldCount,
}

impl CacheNamespace {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MediaList => "media_list",
            Self::StoryList => "story_list",
            Self::StoryCount => "story_count",
            Self::WordCount => "word_count",
            Self::SentenceCount => "sentence_count",
            Self::SentenceSample => "sentence_sample",
            Self::FocalSetList => "focal_sets",
            Self::TimespanList => "timespans",
            Self::FieldCount => "field_count",
        }
    }
}

/// Structured cache key with credential isolation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: CacheNamespace,
    scope: String,
    resource: Option<i64>,
    fingerprint: String,
}

impl CacheKey {
    /// Key for a filtered per-topic query (media/story/word/sentence
    /// families). The fingerprint covers the full merged argument set.
    #[must_use]
    pub fn topic_query(
        namespace: CacheNamespace,
        scope: &str,
        topics_id: i64,
        spec: &QuerySpec,
    ) -> Self {
        Self {
            namespace,
            scope: scope.to_string(),
            resource: Some(topics_id),
            fingerprint: spec.fingerprint(),
        }
    }

    /// Key for a sentence sample: the sample size is part of the identity
    /// alongside the merged arguments
    #[must_use]
    pub fn sentence_sample(scope: &str, topics_id: i64, sample_size: u32, spec: &QuerySpec) -> Self {
        Self {
            namespace: CacheNamespace::SentenceSample,
            scope: scope.to_string(),
            resource: Some(topics_id),
            fingerprint: format!("{}:{}", sample_size, spec.fingerprint()),
        }
    }

    /// Key for a topic's focal-set listing within a snapshot
    #[must_use]
    pub fn focal_sets(scope: &str, topics_id: i64, snapshots_id: Option<i64>) -> Self {
        Self {
            namespace: CacheNamespace::FocalSetList,
            scope: scope.to_string(),
            resource: Some(topics_id),
            fingerprint: format!("s{}", id_or_dash(snapshots_id)),
        }
    }

    /// Key for a topic's timespan listing within a snapshot/focus
    #[must_use]
    pub fn timespan_list(
        scope: &str,
        topics_id: i64,
        snapshots_id: Option<i64>,
        foci_id: Option<i64>,
    ) -> Self {
        Self {
            namespace: CacheNamespace::TimespanList,
            scope: scope.to_string(),
            resource: Some(topics_id),
            fingerprint: format!("s{}:f{}", id_or_dash(snapshots_id), id_or_dash(foci_id)),
        }
    }

    /// Key for a tag breakdown within a single timespan.
    ///
    /// No topic resource: the upstream field-count endpoint is addressed by
    /// timespan, not topic.
    #[must_use]
    pub fn field_count(
        scope: &str,
        timespans_id: Option<i64>,
        tag_sets_id: i64,
        sample_size: u32,
    ) -> Self {
        Self {
            namespace: CacheNamespace::FieldCount,
            scope: scope.to_string(),
            resource: None,
            fingerprint: format!(
                "t{}:ts{tag_sets_id}:n{sample_size}",
                id_or_dash(timespans_id)
            ),
        }
    }

    /// Get the namespace of this key
    #[must_use]
    pub const fn namespace(&self) -> CacheNamespace {
        self.namespace
    }

    /// Namespace-plus-scope prefix for bulk operations
    #[must_use]
    pub fn scope_prefix(&self) -> String {
        format!("{}:{}", self.namespace.as_str(), self.scope)
    }

    /// Convert to string key for storage
    #[must_use]
    pub fn to_key_string(&self) -> String {
        let mut parts = vec![self.namespace.as_str().to_string(), self.scope.clone()];

        if let Some(resource) = self.resource {
            parts.push(resource.to_string());
        }

        parts.push(self.fingerprint.clone());

        parts.join(":")
    }
}

fn id_or_dash(id: Option<i64>) -> String {
    id.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key_string())
    }
}
