use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed upstream payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No timespans available for topic {topics_id}")]
    NoTimespans { topics_id: i64 },
}

impl Error {
    #[must_use]
    pub const fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub const fn is_no_timespans(&self) -> bool {
        matches!(self, Self::NoTimespans { .. })
    }

    /// Upstream HTTP status, when the failure carries one
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
