//! Session store: current bearer token and user identity.
//!
//! The store is an explicitly owned object, usually shared as
//! `Arc<SessionStore>` between the request pipeline and the router. Every
//! mutation replaces the whole [`Session`] under the write lock and is
//! persisted in the same critical section.

pub mod storage;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::StorageError;
use crate::types::User;
use storage::{KeyValueStorage, MemoryStorage, StorageChange, TOKEN_KEY, USER_KEY};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
}

impl Session {
    /// A present token is the only local authentication gate
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    state: RwLock<Session>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SessionStore")
            .field("authenticated", &state.is_authenticated())
            .field("user", &state.user.as_ref().map(|u| u.student_id.as_str()))
            .finish()
    }
}

impl SessionStore {
    /// Restore the session persisted in `storage`.
    ///
    /// Never fails: an unreadable store yields an empty session and is
    /// discarded, and an unparseable `user` entry is dropped while the token
    /// is kept.
    pub fn restore(storage: Arc<dyn KeyValueStorage>) -> Self {
        let session = Self::read_persisted(storage.as_ref());
        tracing::debug!(
            "Session restored (authenticated: {}, user: {})",
            session.is_authenticated(),
            session.user.is_some()
        );

        Self {
            storage,
            state: RwLock::new(session),
        }
    }

    /// Empty session backed by process-local storage
    pub fn in_memory() -> Self {
        Self::restore(Arc::new(MemoryStorage::new()))
    }

    fn read_persisted(storage: &dyn KeyValueStorage) -> Session {
        let (token, user_json) = match (storage.get(TOKEN_KEY), storage.get(USER_KEY)) {
            (Ok(token), Ok(user)) => (token, user),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Discarding unreadable session storage: {}", e);
                if let Err(e) = storage.reset() {
                    tracing::warn!("Failed to discard session storage: {}", e);
                }
                return Session::default();
            }
        };

        let token = token.filter(|t| !t.is_empty());

        let user = match user_json {
            Some(json) => match serde_json::from_str::<User>(&json) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!("Discarding corrupt user entry in session storage: {}", e);
                    if let Err(e) = storage.remove(USER_KEY) {
                        tracing::warn!("Failed to remove corrupt user entry: {}", e);
                    }
                    None
                }
            },
            None => None,
        };

        Session { user, token }
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    /// Replace user and token together.
    ///
    /// The in-memory session is replaced even when persisting fails; the
    /// storage error is returned so the caller can decide how loud to be.
    /// An empty token is stored as no token, the same way `restore` reads it.
    pub fn set_session(&self, user: User, token: String) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&user)?;
        let token = Some(token).filter(|t| !t.is_empty());
        let token_change = match &token {
            Some(token) => StorageChange::set(TOKEN_KEY, token.as_str()),
            None => StorageChange::remove(TOKEN_KEY),
        };

        let mut state = self.state.write();
        let persisted = self
            .storage
            .apply(&[token_change, StorageChange::set(USER_KEY, user_json)]);
        if token.is_some() {
            tracing::info!("Session established for '{}'", user.student_id);
        } else {
            tracing::warn!("Session for '{}' stored without a token", user.student_id);
        }
        *state = Session {
            user: Some(user),
            token,
        };

        persisted
    }

    /// Remove user and token. Idempotent.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let persisted = self.storage.apply(&[
            StorageChange::remove(TOKEN_KEY),
            StorageChange::remove(USER_KEY),
        ]);
        if state.is_authenticated() || state.user.is_some() {
            tracing::info!("Session cleared");
        }
        *state = Session::default();

        persisted
    }

    /// Remove only the token, leaving the cached identity in place
    pub fn clear_token(&self) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let persisted = self.storage.apply(&[StorageChange::remove(TOKEN_KEY)]);
        state.token = None;

        persisted
    }
}
