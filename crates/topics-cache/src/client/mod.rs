//! Upstream topic-analytics API collaborator
//!
//! [`TopicsApi`] is the seam to the remote service: one method per upstream
//! operation, each taking a resource id and the named filter/sort/pagination
//! arguments for that call. [`ClientProvider`] picks the client for a
//! credential - the shared tool client or a per-user client - as a pure
//! function of the credential passed in.

mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use http::{HttpClientProvider, HttpTopicsClient};

use crate::Result;
use crate::auth::Credential;
use crate::query::QuerySpec;
use crate::types::{FieldCount, StoryCount, Timespan};

/// Arguments for listing a topic's timespans
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimespanFilter {
    pub snapshots_id: Option<i64>,
    pub foci_id: Option<i64>,
    pub timespans_id: Option<i64>,
}

/// Remote API operations this layer delegates to.
///
/// Results are returned as upstream delivers them; failures propagate
/// verbatim with no retry or recovery at this seam.
#[async_trait]
pub trait TopicsApi: Send + Sync {
    /// Sorted media list within a topic
    async fn media_list(&self, topics_id: i64, query: &QuerySpec) -> Result<Value>;

    /// Sorted story list within a topic
    async fn story_list(&self, topics_id: i64, query: &QuerySpec) -> Result<Value>;

    /// Filtered story count within a topic
    async fn story_count(&self, topics_id: i64, query: &QuerySpec) -> Result<StoryCount>;

    /// Sampled word counts within a topic
    async fn word_count(&self, topics_id: i64, query: &QuerySpec) -> Result<Value>;

    /// Sentence counts over time within a topic
    async fn sentence_count(&self, topics_id: i64, query: &QuerySpec) -> Result<Value>;

    /// Focal sets defined for a snapshot of a topic
    async fn focal_set_list(&self, topics_id: i64, snapshots_id: Option<i64>) -> Result<Value>;

    /// Timespans defined for a snapshot of a topic
    async fn timespan_list(
        &self,
        topics_id: i64,
        filter: &TimespanFilter,
    ) -> Result<Vec<Timespan>>;

    /// Sentence listing outside the topic tree (used for sampling);
    /// `fq` restricts the match, `random_sort` shuffles for sampling
    async fn sentence_list(
        &self,
        q: Option<&str>,
        fq: Option<&str>,
        rows: u32,
        random_sort: bool,
    ) -> Result<Value>;

    /// Per-value breakdown of a sentence field within a sample
    async fn sentence_field_count(
        &self,
        q: &str,
        fq: Option<&str>,
        field: &str,
        tag_sets_id: i64,
        sample_size: u32,
    ) -> Result<Vec<FieldCount>>;
}

/// Selects the upstream client for a credential
pub trait ClientProvider: Send + Sync {
    fn client_for(&self, credential: &Credential) -> Arc<dyn TopicsApi>;
}
