//! Constants for the topic query facade

/// Default number of sentence-level records sampled for statistical estimates
pub const DEFAULT_SAMPLE_SIZE: u32 = 1000;

/// Tag marking stories excluded from time-based sentence counting because
/// they lack a reliable publication date
pub const STORY_UNDATEABLE_TAG: i64 = 8_877_812;

/// Upstream field name holding the story-level tag ids
pub const FIELD_TAGS_ID_STORIES: &str = "tags_id_stories";

/// Upstream timestamps are `YYYY-MM-DD HH:MM:SS`; split boundaries take the
/// date portion only
pub const DATE_PREFIX_LEN: usize = 10;

/// Cache scope of the shared tool credential
pub const TOOL_CACHE_SCOPE: &str = "tool";
