//! Key-value store trait definition.

use crate::error::{StorageError, StorageResult};

/// A durable key-value store for LiftSync.
///
/// Stores are **opaque value stores**. They hold one byte value per key and
/// replace it as a whole on every write. The sync engine owns all format
/// interpretation - stores do not understand outbox jobs or drafts.
///
/// # Invariants
///
/// - `get` returns exactly the bytes of the last successful `put` for a key
/// - `put` is atomic: a reader sees either the old value or the new one
/// - After `put` returns successfully the value survives process termination
/// - Stores must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write cannot be made
    /// durable.
    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Removes the value stored under `key`. Removing a missing key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Lists every key currently holding a value, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the key listing cannot be read.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Checks that a key only uses `[A-Za-z0-9._-]` and is not empty.
///
/// Every store applies the same rule so that keys valid in memory are also
/// valid as file names.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] for an empty key, a key starting
/// with `.`, or a key with any other character.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
