//! # LiftSync Storage
//!
//! Durable key-value stores for LiftSync.
//!
//! The sync engine persists its outbox, dead letters and session draft as
//! whole serialized values under a handful of keys. Stores are **opaque
//! value stores**: they never interpret the bytes they hold.
//!
//! ## Design Principles
//!
//! - One value per key, replaced as a whole on every write
//! - A completed `put` survives process termination
//! - Must be `Send + Sync` for shared access
//! - Callers own all format interpretation
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral state
//! - [`FileStore`] - One file per key in a locked directory
//!
//! ## Example
//!
//! ```rust
//! use liftsync_storage::{KeyValueStore, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! store.put("outbox.pending", b"[]").unwrap();
//! assert_eq!(store.get("outbox.pending").unwrap().as_deref(), Some(&b"[]"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{validate_key, KeyValueStore};
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
