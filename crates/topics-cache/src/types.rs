//! Upstream record shapes the facade inspects
//!
//! List endpoints pass upstream JSON through untouched; only the records
//! this layer actually reads fields from (counts, timespans, tag rows) get
//! typed shapes. Unmodeled upstream fields ride along via `serde(flatten)`
//! so nothing is dropped between upstream and caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filtered story count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryCount {
    pub count: u64,
}

/// A date-bounded slice of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timespan {
    pub timespans_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshots_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foci_id: Option<i64>,
    /// `YYYY-MM-DD HH:MM:SS` as delivered by upstream
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_count: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One row of a field-count breakdown (most-used tags within a set)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub count: u64,
    /// Relative frequency within the sample; derived here, not upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pct: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// How much of a topic's filtered story set carries a given tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCoverage {
    /// Stories matching the ambient filters and the tag clause
    pub count: u64,
    /// Stories matching the ambient filters alone
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_count_roundtrip() {
        let parsed: StoryCount = serde_json::from_str(r#"{"count": 1234}"#).unwrap();
        assert_eq!(parsed.count, 1234);
    }

    #[test]
    fn test_timespan_keeps_unmodeled_fields() {
        let json = r#"{
            "timespans_id": 2,
            "snapshots_id": 10,
            "start_date": "2024-01-01 00:00:00",
            "end_date": "2024-02-01 00:00:00",
            "period": "monthly",
            "story_count": 99,
            "is_shell": false
        }"#;
        let parsed: Timespan = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.timespans_id, 2);
        assert_eq!(parsed.period.as_deref(), Some("monthly"));
        assert_eq!(parsed.extra.get("is_shell"), Some(&Value::Bool(false)));

        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back.get("is_shell"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_timespan_minimal_fields() {
        let json = r#"{
            "timespans_id": 7,
            "start_date": "2024-01-01 00:00:00",
            "end_date": "2024-01-08 00:00:00"
        }"#;
        let parsed: Timespan = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.snapshots_id, None);
        assert_eq!(parsed.foci_id, None);
    }

    #[test]
    fn test_field_count_pct_absent_from_upstream() {
        let parsed: FieldCount =
            serde_json::from_str(r#"{"tags_id": 5, "label": "politics", "count": 250}"#).unwrap();
        assert_eq!(parsed.pct, None);
        assert_eq!(parsed.count, 250);
    }

    #[test]
    fn test_tag_coverage_serialization() {
        let coverage = TagCoverage {
            count: 12,
            total: 100,
        };
        let json = serde_json::to_string(&coverage).unwrap();
        assert!(json.contains("\"count\":12"));
        assert!(json.contains("\"total\":100"));
    }
}
