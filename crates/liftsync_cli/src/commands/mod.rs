//! CLI command implementations.

pub mod draft;
pub mod outbox;

use clap::ValueEnum;
use liftsync_storage::{FileStore, StorageError};
use liftsync_sync_engine::{DraftStore, Outbox, SyncConfig, SyncError};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// No job with the requested key.
    #[error("no queued job with key {0}")]
    JobNotFound(String),

    /// Store error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Outbox or draft error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Output encoding error.
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    Text,
    /// JSON
    Json,
}

/// Opens the outbox in a store directory using the default keys.
pub fn open_outbox(path: &Path) -> CliResult<Outbox> {
    let config = SyncConfig::default();
    let store = Arc::new(FileStore::open(path)?);
    Ok(Outbox::new(store, config.outbox_key, config.dead_letter_key))
}

/// Opens the draft store in a store directory using the default key.
pub fn open_drafts(path: &Path) -> CliResult<DraftStore> {
    let config = SyncConfig::default();
    let store = Arc::new(FileStore::open(path)?);
    Ok(DraftStore::new(store, config.draft_key))
}
