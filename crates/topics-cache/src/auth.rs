//! Credential selection and session collaborators
//!
//! Two credential classes exist: the shared tool API key and a per-user API
//! key. The credential picks the upstream client and is folded into every
//! cache key so one caller's cached result is never served to another.
//! Raw key material never appears in key strings, `Debug` output, or logs;
//! user keys are reduced to a 16-hex digest first.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use crate::Result;
use crate::constants::TOOL_CACHE_SCOPE;

/// Which API key a call runs under
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Credential {
    /// The shared tool-level API key
    Tool,
    /// A per-user API key
    User(String),
}

impl Credential {
    /// Cache-key scope for this credential: `tool` for the shared key, a
    /// key digest for user keys. Deterministic, and distinct per user key.
    #[must_use]
    pub fn cache_scope(&self) -> String {
        match self {
            Self::Tool => TOOL_CACHE_SCOPE.to_string(),
            Self::User(key) => {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                format!("u:{:016x}", hasher.finish())
            }
        }
    }

    #[must_use]
    pub const fn is_tool(&self) -> bool {
        matches!(self, Self::Tool)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool => f.write_str("Credential::Tool"),
            Self::User(_) => f.write_str("Credential::User(<redacted>)"),
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_scope())
    }
}

/// The caller's session, as resolved by the layer above.
///
/// Anonymous sessions carry no credential; authenticated sessions carry the
/// user's credential.
#[derive(Debug, Clone, Default)]
pub struct Session {
    credential: Option<Credential>,
}

impl Session {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { credential: None }
    }

    #[must_use]
    pub const fn logged_in(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
        }
    }

    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.credential.is_some()
    }
}

/// Resolves whether a topic is publicly readable.
///
/// Injected by the embedding application; typically backed by the upstream
/// topic record or a local permission table.
#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn topic_is_public(&self, topics_id: i64) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_scope_is_stable() {
        assert_eq!(Credential::Tool.cache_scope(), "tool");
    }

    #[test]
    fn test_user_scope_deterministic() {
        let a = Credential::User("key-123".to_string());
        let b = Credential::User("key-123".to_string());
        assert_eq!(a.cache_scope(), b.cache_scope());
    }

    #[test]
    fn test_user_scopes_differ_per_key() {
        let a = Credential::User("key-123".to_string());
        let b = Credential::User("key-456".to_string());
        assert_ne!(a.cache_scope(), b.cache_scope());
    }

    #[test]
    fn test_user_scope_differs_from_tool() {
        let user = Credential::User("key-123".to_string());
        assert_ne!(user.cache_scope(), Credential::Tool.cache_scope());
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let user = Credential::User("super-secret".to_string());
        let debug = format!("{user:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_display_shows_scope_not_key() {
        let user = Credential::User("super-secret".to_string());
        let shown = user.to_string();
        assert!(!shown.contains("super-secret"));
        assert!(shown.starts_with("u:"));
    }

    #[test]
    fn test_session_states() {
        assert!(!Session::anonymous().is_logged_in());

        let session = Session::logged_in(Credential::User("k".to_string()));
        assert!(session.is_logged_in());
        assert!(session.credential().is_some());
    }
}
