//! Request filter extraction and upstream argument merging
//!
//! The ambient filter state of a request is captured once as a [`FilterSet`]
//! (plus list-endpoint extras in [`RequestParams`]) and never mutated
//! afterwards. Each facade entry point builds a [`QuerySpec`] base from it
//! and merges caller-supplied overrides on top; an override always wins over
//! the ambient value for the same field, including explicitly empty or zero
//! overrides.

use std::collections::hash_map::DefaultHasher;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Query-string parameter names recognized during extraction
mod params {
    pub const SNAPSHOT_ID: &str = "snapshotId";
    pub const TIMESPAN_ID: &str = "timespanId";
    pub const FOCUS_ID: &str = "focusId";
    pub const QUERY: &str = "q";
    pub const SORT: &str = "sort";
    pub const LIMIT: &str = "limit";
    pub const LINK_ID: &str = "linkId";
}

/// Ambient filter four-tuple extracted from a request's query string.
///
/// Ids that fail to parse as integers extract as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    pub snapshots_id: Option<i64>,
    pub timespans_id: Option<i64>,
    pub foci_id: Option<i64>,
    pub q: Option<String>,
}

impl FilterSet {
    /// Extract the filter four-tuple from query-string pairs.
    ///
    /// The first occurrence of each parameter wins, matching typical
    /// query-string accessor semantics.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filters = Self::default();
        for (name, value) in pairs {
            match name {
                params::SNAPSHOT_ID if filters.snapshots_id.is_none() => {
                    filters.snapshots_id = value.parse().ok();
                }
                params::TIMESPAN_ID if filters.timespans_id.is_none() => {
                    filters.timespans_id = value.parse().ok();
                }
                params::FOCUS_ID if filters.foci_id.is_none() => {
                    filters.foci_id = value.parse().ok();
                }
                params::QUERY if filters.q.is_none() => {
                    filters.q = Some(value.to_string());
                }
                _ => {}
            }
        }
        filters
    }
}

/// Everything a facade entry point reads from the request: the filter
/// four-tuple plus the sort/pagination extras list endpoints consume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub filters: FilterSet,
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub link_id: Option<String>,
}

impl RequestParams {
    /// Extract filters and list extras from query-string pairs
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)> + Clone,
    {
        let mut request = Self {
            filters: FilterSet::from_query_pairs(pairs.clone()),
            ..Self::default()
        };
        for (name, value) in pairs {
            match name {
                params::SORT if request.sort.is_none() => {
                    request.sort = Some(value.to_string());
                }
                params::LIMIT if request.limit.is_none() => {
                    request.limit = value.parse().ok();
                }
                params::LINK_ID if request.link_id.is_none() => {
                    request.link_id = Some(value.to_string());
                }
                _ => {}
            }
        }
        request
    }
}

/// Full typed argument set for an upstream call.
///
/// Every field is optional; `None` means "not supplied" and is omitted from
/// the wire. Explicitly supplied empty strings and zeroes are sent as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuerySpec {
    pub snapshots_id: Option<i64>,
    pub timespans_id: Option<i64>,
    pub foci_id: Option<i64>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub link_id: Option<String>,
    pub sample_size: Option<u32>,
    pub split: Option<bool>,
    pub split_start_date: Option<String>,
    pub split_end_date: Option<String>,
}

macro_rules! merge_fields {
    ($base:expr, $overrides:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$overrides.$field {
                $base.$field = Some(value.clone());
            }
        )+
    };
}

impl QuerySpec {
    /// Base argument set for count-style endpoints: the filter four-tuple
    #[must_use]
    pub fn from_filters(filters: &FilterSet) -> Self {
        Self {
            snapshots_id: filters.snapshots_id,
            timespans_id: filters.timespans_id,
            foci_id: filters.foci_id,
            q: filters.q.clone(),
            ..Self::default()
        }
    }

    /// Base argument set for list-style endpoints: filters plus
    /// sort/limit/link id
    #[must_use]
    pub fn from_request(request: &RequestParams) -> Self {
        Self {
            sort: request.sort.clone(),
            limit: request.limit,
            link_id: request.link_id.clone(),
            ..Self::from_filters(&request.filters)
        }
    }

    /// Merge `overrides` on top of this base. A `Some` in the override wins
    /// for that field, whatever the value; a `None` leaves the base alone.
    #[must_use]
    pub fn merge(mut self, overrides: &Self) -> Self {
        merge_fields!(
            self,
            overrides,
            snapshots_id,
            timespans_id,
            foci_id,
            q,
            sort,
            limit,
            link_id,
            sample_size,
            split,
            split_start_date,
            split_end_date,
        );
        self
    }

    /// Canonical textual form of the supplied fields, used as the hash input
    /// for cache-key fingerprints
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        let mut push = |name: &str, value: &str| {
            if !out.is_empty() {
                out.push('&');
            }
            let _ = write!(out, "{name}={value}");
        };
        if let Some(v) = self.snapshots_id {
            push("snapshots_id", &v.to_string());
        }
        if let Some(v) = self.timespans_id {
            push("timespans_id", &v.to_string());
        }
        if let Some(v) = self.foci_id {
            push("foci_id", &v.to_string());
        }
        if let Some(v) = &self.q {
            push("q", v);
        }
        if let Some(v) = &self.sort {
            push("sort", v);
        }
        if let Some(v) = self.limit {
            push("limit", &v.to_string());
        }
        if let Some(v) = &self.link_id {
            push("link_id", v);
        }
        if let Some(v) = self.sample_size {
            push("sample_size", &v.to_string());
        }
        if let Some(v) = self.split {
            push("split", &v.to_string());
        }
        if let Some(v) = &self.split_start_date {
            push("split_start_date", v);
        }
        if let Some(v) = &self.split_end_date {
            push("split_end_date", v);
        }
        out
    }

    /// Deterministic discriminator for cache keys.
    ///
    /// Hash plus input length, so identical effective arguments always map
    /// to the same fingerprint and a hash collision still needs matching
    /// lengths to collide fully.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let canonical = self.canonical();
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        format!("{:016x}:{}", hasher.finish(), canonical.len())
    }

    /// Wire form: name/value pairs for the supplied fields only
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(v) = self.snapshots_id {
            pairs.push(("snapshots_id", v.to_string()));
        }
        if let Some(v) = self.timespans_id {
            pairs.push(("timespans_id", v.to_string()));
        }
        if let Some(v) = self.foci_id {
            pairs.push(("foci_id", v.to_string()));
        }
        if let Some(v) = &self.q {
            pairs.push(("q", v.clone()));
        }
        if let Some(v) = &self.sort {
            pairs.push(("sort", v.clone()));
        }
        if let Some(v) = self.limit {
            pairs.push(("limit", v.to_string()));
        }
        if let Some(v) = &self.link_id {
            pairs.push(("link_id", v.clone()));
        }
        if let Some(v) = self.sample_size {
            pairs.push(("sample_size", v.to_string()));
        }
        if let Some(v) = self.split {
            pairs.push(("split", v.to_string()));
        }
        if let Some(v) = &self.split_start_date {
            pairs.push(("split_start_date", v.clone()));
        }
        if let Some(v) = &self.split_end_date {
            pairs.push(("split_end_date", v.clone()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_extraction() {
        let pairs = [
            ("snapshotId", "101"),
            ("timespanId", "202"),
            ("focusId", "303"),
            ("q", "climate"),
            ("unrelated", "x"),
        ];
        let filters = FilterSet::from_query_pairs(pairs);
        assert_eq!(filters.snapshots_id, Some(101));
        assert_eq!(filters.timespans_id, Some(202));
        assert_eq!(filters.foci_id, Some(303));
        assert_eq!(filters.q.as_deref(), Some("climate"));
    }

    #[test]
    fn test_filter_extraction_missing_and_garbage() {
        let pairs = [("snapshotId", "not-a-number"), ("q", "")];
        let filters = FilterSet::from_query_pairs(pairs);
        assert_eq!(filters.snapshots_id, None);
        assert_eq!(filters.timespans_id, None);
        assert_eq!(filters.q.as_deref(), Some(""));
    }

    #[test]
    fn test_filter_extraction_first_occurrence_wins() {
        let pairs = [("q", "first"), ("q", "second")];
        let filters = FilterSet::from_query_pairs(pairs);
        assert_eq!(filters.q.as_deref(), Some("first"));
    }

    #[test]
    fn test_request_params_extraction() {
        let pairs = [
            ("snapshotId", "1"),
            ("sort", "inlink"),
            ("limit", "50"),
            ("linkId", "abc"),
        ];
        let request = RequestParams::from_query_pairs(pairs);
        assert_eq!(request.filters.snapshots_id, Some(1));
        assert_eq!(request.sort.as_deref(), Some("inlink"));
        assert_eq!(request.limit, Some(50));
        assert_eq!(request.link_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_merge_override_wins() {
        let base = QuerySpec {
            snapshots_id: Some(1),
            q: Some("ambient".to_string()),
            ..QuerySpec::default()
        };
        let overrides = QuerySpec {
            q: Some("explicit".to_string()),
            ..QuerySpec::default()
        };
        let merged = base.merge(&overrides);
        assert_eq!(merged.snapshots_id, Some(1));
        assert_eq!(merged.q.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_merge_empty_override_still_wins() {
        let base = QuerySpec {
            q: Some("ambient".to_string()),
            limit: Some(100),
            ..QuerySpec::default()
        };
        let overrides = QuerySpec {
            q: Some(String::new()),
            limit: Some(0),
            ..QuerySpec::default()
        };
        let merged = base.merge(&overrides);
        assert_eq!(merged.q.as_deref(), Some(""));
        assert_eq!(merged.limit, Some(0));
    }

    #[test]
    fn test_merge_none_leaves_base() {
        let base = QuerySpec {
            timespans_id: Some(7),
            sort: Some("social".to_string()),
            ..QuerySpec::default()
        };
        let merged = base.clone().merge(&QuerySpec::default());
        assert_eq!(merged, base);
    }

    #[test]
    fn test_from_filters_excludes_list_extras() {
        let request = RequestParams {
            filters: FilterSet {
                snapshots_id: Some(1),
                q: Some("foo".to_string()),
                ..FilterSet::default()
            },
            sort: Some("inlink".to_string()),
            limit: Some(10),
            link_id: Some("next".to_string()),
        };
        let spec = QuerySpec::from_filters(&request.filters);
        assert_eq!(spec.snapshots_id, Some(1));
        assert_eq!(spec.sort, None);
        assert_eq!(spec.limit, None);
        assert_eq!(spec.link_id, None);
    }

    #[test]
    fn test_from_request_includes_list_extras() {
        let request = RequestParams {
            filters: FilterSet {
                foci_id: Some(3),
                ..FilterSet::default()
            },
            sort: Some("inlink".to_string()),
            limit: Some(10),
            link_id: Some("next".to_string()),
        };
        let spec = QuerySpec::from_request(&request);
        assert_eq!(spec.foci_id, Some(3));
        assert_eq!(spec.sort.as_deref(), Some("inlink"));
        assert_eq!(spec.limit, Some(10));
        assert_eq!(spec.link_id.as_deref(), Some("next"));
    }

    #[test]
    fn test_canonical_skips_unset_fields() {
        let spec = QuerySpec {
            timespans_id: Some(5),
            q: Some("foo".to_string()),
            ..QuerySpec::default()
        };
        assert_eq!(spec.canonical(), "timespans_id=5&q=foo");
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let make = || QuerySpec {
            snapshots_id: Some(9),
            q: Some("foo AND bar".to_string()),
            ..QuerySpec::default()
        };
        assert_eq!(make().fingerprint(), make().fingerprint());
    }

    #[test]
    fn test_fingerprint_distinguishes_args() {
        let a = QuerySpec {
            q: Some("foo".to_string()),
            ..QuerySpec::default()
        };
        let b = QuerySpec {
            q: Some("bar".to_string()),
            ..QuerySpec::default()
        };
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_distinguishes_empty_from_absent() {
        let absent = QuerySpec::default();
        let empty = QuerySpec {
            q: Some(String::new()),
            ..QuerySpec::default()
        };
        assert_ne!(absent.fingerprint(), empty.fingerprint());
    }

    #[test]
    fn test_query_pairs_wire_names() {
        let spec = QuerySpec {
            snapshots_id: Some(1),
            split: Some(true),
            split_start_date: Some("2024-01-01".to_string()),
            split_end_date: Some("2024-02-01".to_string()),
            ..QuerySpec::default()
        };
        let pairs = spec.to_query_pairs();
        assert!(pairs.contains(&("snapshots_id", "1".to_string())));
        assert!(pairs.contains(&("split", "true".to_string())));
        assert!(pairs.contains(&("split_start_date", "2024-01-01".to_string())));
        assert!(pairs.contains(&("split_end_date", "2024-02-01".to_string())));
    }
}
