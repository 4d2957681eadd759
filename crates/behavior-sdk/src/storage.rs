//! Key/value storage seam — the Rust rendition of the browser's session and
//! local storage globals. Backends may fail on any call (private browsing,
//! quota); callers degrade to no-persistence for that call.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// String key/value storage. Mirrors the `getItem`/`setItem`/`removeItem`
/// surface of web storage, with failure made explicit.
pub trait KvStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// The two storage scopes the trackers write into: `session` lives for one
/// tab (session id, milestone marks), `local` persists across tabs (the
/// behavior store blob).
#[derive(Clone)]
pub struct StorageScopes {
    pub session: Arc<dyn KvStorage>,
    pub local: Arc<dyn KvStorage>,
}

impl StorageScopes {
    pub fn new(session: Arc<dyn KvStorage>, local: Arc<dyn KvStorage>) -> Self {
        Self { session, local }
    }

    /// Fresh in-memory scopes, used in tests and headless hosts.
    pub fn in_memory() -> Self {
        Self {
            session: Arc::new(MemoryStorage::new()),
            local: Arc::new(MemoryStorage::new()),
        }
    }

    /// Scopes whose every call fails, modeling fully denied storage.
    pub fn failing() -> Self {
        Self {
            session: Arc::new(FailingStorage),
            local: Arc::new(FailingStorage),
        }
    }
}

/// Thread-safe in-memory backend.
#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Backend that rejects every call, as a privacy-mode browser does.
pub struct FailingStorage;

impl KvStorage for FailingStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("access denied".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("access denied".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("access denied".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));
        assert_eq!(storage.len(), 1);

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_failing_storage_rejects_everything() {
        let storage = FailingStorage;
        assert!(storage.get("k").is_err());
        assert!(storage.set("k", "v").is_err());
        assert!(storage.remove("k").is_err());
    }

    #[test]
    fn test_in_memory_scopes_are_distinct() {
        let scopes = StorageScopes::in_memory();
        scopes.session.set("k", "session").unwrap();
        assert_eq!(scopes.local.get("k").unwrap(), None);
    }
}
