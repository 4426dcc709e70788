//! Session state.
//!
//! Process-wide singleton: initialized from durable storage at startup,
//! mutated only by the explicit login/logout operations. Everything else
//! reads it. The token is opaque to the client; it is attached as a bearer
//! credential and otherwise never inspected.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};

use green_mango_core::ProfileId;

use crate::storage::Storage;

/// The current session: an opaque token and the profile it belongs to.
#[derive(Clone, Default)]
pub struct Session {
    token: Option<SecretString>,
    profile_id: Option<ProfileId>,
}

impl Session {
    /// Whether a token is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The profile id, if one is set.
    #[must_use]
    pub const fn profile_id(&self) -> Option<&ProfileId> {
        self.profile_id.as_ref()
    }

    /// The raw token, for building the `Authorization` header.
    #[must_use]
    pub fn expose_token(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|t| t.expose_secret().to_string())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field(
                "token",
                &self.token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("profile_id", &self.profile_id)
            .finish()
    }
}

/// Process-wide session store. Cheaply cloneable; clones share the session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    current: Mutex<Session>,
    storage: Storage,
}

impl SessionStore {
    /// Create a store seeded from the persisted document.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        let snapshot = storage.snapshot();
        let current = Session {
            token: snapshot.session_token.map(SecretString::from),
            profile_id: snapshot.profile_id,
        };
        Self {
            inner: Arc::new(SessionInner {
                current: Mutex::new(current),
                storage,
            }),
        }
    }

    fn locked(&self) -> MutexGuard<'_, Session> {
        self.inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a fresh token and profile id, persisting both.
    pub fn login(&self, token: impl Into<String>, profile_id: ProfileId) {
        let token = token.into();
        {
            let mut current = self.locked();
            current.token = Some(SecretString::from(token.clone()));
            current.profile_id = Some(profile_id.clone());
        }
        self.inner
            .storage
            .set_session(Some(token), Some(profile_id));
        tracing::debug!("session established");
    }

    /// Drop the token and profile id, persisting the teardown. The caller
    /// is responsible for clearing dependent state (the facade also clears
    /// the cart).
    pub fn logout(&self) {
        {
            let mut current = self.locked();
            current.token = None;
            current.profile_id = None;
        }
        self.inner.storage.set_session(None, None);
        tracing::debug!("session cleared");
    }

    /// A copy of the current session.
    #[must_use]
    pub fn current(&self) -> Session {
        self.locked().clone()
    }

    /// Whether a token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.locked().is_authenticated()
    }

    /// The current profile id, if any.
    #[must_use]
    pub fn profile_id(&self) -> Option<ProfileId> {
        self.locked().profile_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::{MemoryStore, StateStore, StoredState};

    #[test]
    fn test_login_then_logout() {
        let storage = Storage::open(MemoryStore::default()).expect("open");
        let sessions = SessionStore::new(storage.clone());
        assert!(!sessions.is_authenticated());

        sessions.login("tok-1", ProfileId::new("u-1"));
        assert!(sessions.is_authenticated());
        assert_eq!(sessions.profile_id(), Some(ProfileId::new("u-1")));
        assert_eq!(storage.snapshot().session_token.as_deref(), Some("tok-1"));

        sessions.logout();
        assert!(!sessions.is_authenticated());
        assert_eq!(sessions.profile_id(), None);
        let snapshot = storage.snapshot();
        assert_eq!(snapshot.session_token, None);
        assert_eq!(snapshot.profile_id, None);
    }

    #[test]
    fn test_seeded_from_persisted_document() {
        let store = MemoryStore::default();
        store
            .write(&StoredState {
                session_token: Some("tok-9".to_string()),
                profile_id: Some(ProfileId::new("u-9")),
                ..StoredState::default()
            })
            .expect("write");

        let sessions = SessionStore::new(Storage::open(store).expect("open"));
        assert!(sessions.is_authenticated());
        assert_eq!(sessions.current().expose_token().as_deref(), Some("tok-9"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let storage = Storage::open(MemoryStore::default()).expect("open");
        let sessions = SessionStore::new(storage);
        sessions.login("super-secret-token", ProfileId::new("u-1"));

        let debug = format!("{:?}", sessions.current());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-token"));
    }
}
