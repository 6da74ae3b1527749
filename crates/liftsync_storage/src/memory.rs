//! In-memory key-value store for testing.

use crate::backend::{validate_key, KeyValueStore};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// An in-memory key-value store.
///
/// This store keeps all values in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral sessions that don't need persistence
///
/// Writes can be switched off with [`InMemoryStore::set_read_only`] to
/// exercise callers' handling of a store that refuses writes.
///
/// # Example
///
/// ```rust
/// use liftsync_storage::{KeyValueStore, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// store.put("k", b"value").unwrap();
/// assert_eq!(store.keys().unwrap(), vec!["k".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: RwLock<BTreeMap<String, Vec<u8>>>,
    read_only: AtomicBool,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding a single pre-existing value.
    ///
    /// Useful for testing recovery from corrupt content.
    #[must_use]
    pub fn with_value(key: &str, value: &[u8]) -> Self {
        let store = Self::new();
        store.values.write().insert(key.to_string(), value.to_vec());
        store
    }

    /// Makes every subsequent `put` and `remove` fail.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Removes every value.
    pub fn clear(&self) {
        self.values.write().clear();
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StorageError::WriteRejected("store is read-only".into()));
        }
        Ok(())
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.values.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        self.check_writable()?;
        self.values.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.check_writable()?;
        self.values.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.values.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_put_and_get() {
        let store = InMemoryStore::new();
        store.put("a", b"hello").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"hello".to_vec()));
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn memory_put_replaces() {
        let store = InMemoryStore::new();
        store.put("a", b"one").unwrap();
        store.put("a", b"two").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn memory_remove() {
        let store = InMemoryStore::new();
        store.put("a", b"x").unwrap();
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn memory_read_only_rejects_writes() {
        let store = InMemoryStore::with_value("a", b"kept");
        store.set_read_only(true);

        assert!(matches!(
            store.put("a", b"new"),
            Err(StorageError::WriteRejected(_))
        ));
        assert!(store.remove("a").is_err());
        assert_eq!(store.get("a").unwrap(), Some(b"kept".to_vec()));

        store.set_read_only(false);
        store.put("a", b"new").unwrap();
    }

    #[test]
    fn memory_invalid_key() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.put("a/b", b"x"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn memory_keys_sorted() {
        let store = InMemoryStore::new();
        store.put("b", b"1").unwrap();
        store.put("a", b"2").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);

        store.clear();
        assert!(store.keys().unwrap().is_empty());
    }
}
