//! Session token holder.
//!
//! # Responsibility
//! - Carry the opaque token handed out at sign-in.
//! - Track whether the engine currently believes it is authenticated.
//!
//! # Invariants
//! - The token is opaque; nothing in the core parses it.
//! - Any `Unauthorized` backend error clears the cache immediately.

/// Opaque bearer token returned by [`crate::backend::NoteBackend::signin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// In-memory record of the current session.
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    token: Option<SessionToken>,
}

impl SessionCache {
    pub fn set(&mut self, token: SessionToken) {
        self.token = Some(token);
    }

    /// Drops the token; the next mutation will require a fresh sign-in.
    pub fn clear(&mut self) {
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionCache, SessionToken};

    #[test]
    fn cache_starts_unauthenticated_and_clears() {
        let mut cache = SessionCache::default();
        assert!(!cache.is_authenticated());

        cache.set(SessionToken::new("abc"));
        assert!(cache.is_authenticated());
        assert_eq!(cache.token().map(SessionToken::as_str), Some("abc"));

        cache.clear();
        assert!(!cache.is_authenticated());
    }
}
