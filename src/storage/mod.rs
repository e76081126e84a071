use serde::de::DeserializeOwned;
use serde::Serialize;

#[cfg(test)]
mod memory;
#[cfg(test)]
pub(crate) use memory::MemoryStorage;

pub(crate) const ACCESS_TOKEN_KEY: &str = "access_token";
pub(crate) const REFRESH_TOKEN_KEY: &str = "refresh_token";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum StorageError {
    #[error("local storage is not available")]
    Unavailable,

    #[error("storage backend rejected `{key}`: {message}")]
    Backend { key: String, message: String },

    #[error("could not encode `{key}`: {message}")]
    Encode { key: String, message: String },

    #[error("stored value under `{key}` is corrupt: {message}")]
    Corrupt { key: String, message: String },
}

/// Raw string key/value backend.
pub(crate) trait KeyValueStore: Clone {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Browser `window.localStorage`.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(StorageError::Unavailable)
    }
}

fn backend_error(key: &str, e: wasm_bindgen::JsValue) -> StorageError {
    StorageError::Backend {
        key: key.to_string(),
        message: format!("{e:?}"),
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| backend_error(key, e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| backend_error(key, e))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| backend_error(key, e))
    }
}

/// A named, typed value kept under a fixed storage key.
pub(crate) trait Record {
    const KEY: &'static str;
    type Value;

    fn encode(value: &Self::Value) -> Result<String, StorageError>;
    fn decode(raw: &str) -> Result<Self::Value, StorageError>;
}

pub(crate) fn encode_json<T: Serialize>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Encode {
        key: key.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn decode_json<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

// Tokens are stored as bare strings, not JSON, so other readers of
// localStorage see the same values the server issued.
pub(crate) struct AccessTokenRecord;

impl Record for AccessTokenRecord {
    const KEY: &'static str = ACCESS_TOKEN_KEY;
    type Value = String;

    fn encode(value: &String) -> Result<String, StorageError> {
        Ok(value.clone())
    }

    fn decode(raw: &str) -> Result<String, StorageError> {
        Ok(raw.to_string())
    }
}

pub(crate) struct RefreshTokenRecord;

impl Record for RefreshTokenRecord {
    const KEY: &'static str = REFRESH_TOKEN_KEY;
    type Value = String;

    fn encode(value: &String) -> Result<String, StorageError> {
        Ok(value.clone())
    }

    fn decode(raw: &str) -> Result<String, StorageError> {
        Ok(raw.to_string())
    }
}

/// Typed get/set/delete over a raw backend.
#[derive(Clone, Debug)]
pub(crate) struct TypedStore<S> {
    inner: S,
}

impl<S: KeyValueStore> TypedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn get<R: Record>(&self) -> Result<Option<R::Value>, StorageError> {
        match self.inner.get_item(R::KEY)? {
            Some(raw) => R::decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn set<R: Record>(&self, value: &R::Value) -> Result<(), StorageError> {
        let raw = R::encode(value)?;
        self.inner.set_item(R::KEY, &raw)
    }

    pub fn delete<R: Record>(&self) -> Result<(), StorageError> {
        self.inner.remove_item(R::KEY)
    }
}
