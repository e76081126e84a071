use crate::storage::{
    AccessTokenRecord, KeyValueStore, RefreshTokenRecord, StorageError, TypedStore,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Tokens {
    access: String,
    refresh: String,
}

/// Signed-in state shared by the HTTP client and the views.
///
/// Tokens live in memory and are written through to storage on every
/// transition (`set_tokens`, `clear_tokens`). Clones share the same state.
#[derive(Clone, Debug)]
pub(crate) struct Session<S> {
    store: TypedStore<S>,
    tokens: Arc<Mutex<Tokens>>,
}

impl<S: KeyValueStore> Session<S> {
    /// Load persisted tokens. Unreadable storage starts a signed-out session.
    pub fn restore(backend: S) -> Self {
        let store = TypedStore::new(backend);

        let read = |r: Result<Option<String>, StorageError>| match r {
            Ok(v) => v.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not read persisted token");
                String::new()
            }
        };

        let tokens = Tokens {
            access: read(store.get::<AccessTokenRecord>()),
            refresh: read(store.get::<RefreshTokenRecord>()),
        };

        Self {
            store,
            tokens: Arc::new(Mutex::new(tokens)),
        }
    }

    fn tokens(&self) -> MutexGuard<'_, Tokens> {
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn access_token(&self) -> Option<String> {
        Some(self.tokens().access.clone()).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        Some(self.tokens().refresh.clone()).filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        !self.tokens().access.is_empty()
    }

    /// Memory is updated even if persisting fails.
    pub fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), StorageError> {
        {
            let mut t = self.tokens();
            t.access = access.to_string();
            t.refresh = refresh.to_string();
        }
        self.store.set::<AccessTokenRecord>(&access.to_string())?;
        self.store.set::<RefreshTokenRecord>(&refresh.to_string())?;
        info!("session tokens updated");
        Ok(())
    }

    pub fn clear_tokens(&self) -> Result<(), StorageError> {
        *self.tokens() = Tokens::default();
        self.store.delete::<AccessTokenRecord>()?;
        self.store.delete::<RefreshTokenRecord>()?;
        info!("session tokens cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    #[test]
    fn test_fresh_session_is_signed_out() {
        let session = Session::restore(MemoryStorage::new());
        assert!(!session.is_authenticated());
        assert!(session.access_token().is_none());
        assert!(session.refresh_token().is_none());
    }

    #[test]
    fn test_set_tokens_authenticates_and_persists() {
        let backend = MemoryStorage::new();
        let session = Session::restore(backend.clone());

        session.set_tokens("acc", "ref").unwrap();

        assert!(session.is_authenticated());
        assert_eq!(backend.get_item(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("acc"));
        assert_eq!(backend.get_item(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("ref"));
    }

    #[test]
    fn test_clear_tokens_signs_out_and_erases_storage() {
        let backend = MemoryStorage::new();
        let session = Session::restore(backend.clone());
        session.set_tokens("acc", "ref").unwrap();

        session.clear_tokens().unwrap();

        assert!(!session.is_authenticated());
        assert!(backend.get_item(ACCESS_TOKEN_KEY).unwrap().is_none());
        assert!(backend.get_item(REFRESH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_empty_access_token_is_not_authenticated() {
        let session = Session::restore(MemoryStorage::new());
        session.set_tokens("", "ref").unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.refresh_token().as_deref(), Some("ref"));
    }

    #[test]
    fn test_restore_picks_up_persisted_tokens() {
        let backend = MemoryStorage::new();
        backend.set_item(ACCESS_TOKEN_KEY, "persisted").unwrap();

        let session = Session::restore(backend);

        assert!(session.is_authenticated());
        assert_eq!(session.access_token().as_deref(), Some("persisted"));
        assert!(session.refresh_token().is_none());
    }

    #[test]
    fn test_clones_observe_the_same_transitions() {
        let session = Session::restore(MemoryStorage::new());
        let other = session.clone();

        session.set_tokens("acc", "ref").unwrap();
        assert!(other.is_authenticated());

        other.clear_tokens().unwrap();
        assert!(!session.is_authenticated());
    }
}
