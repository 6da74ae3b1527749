//! Persistence for a paused session.

use crate::error::{SyncError, SyncResult};
use liftsync_session::{Session, SessionSnapshot};
use liftsync_storage::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Stores at most one in-progress session snapshot.
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl DraftStore {
    /// Opens the draft stored under `key`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Saves the session, replacing any previous draft.
    pub fn save(&self, session: &Session) -> SyncResult<()> {
        let bytes = serde_json::to_vec(session.snapshot()).map_err(|e| SyncError::Codec(e.to_string()))?;
        self.store.put(&self.key, &bytes)?;
        debug!(workout_id = %session.workout().id, "draft saved");
        Ok(())
    }

    /// The stored snapshot. Corrupt content reads as no draft.
    pub fn load(&self) -> SyncResult<Option<SessionSnapshot>> {
        let Some(bytes) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(key = %self.key, error = %e, "corrupt draft, ignoring");
                Ok(None)
            }
        }
    }

    /// Loads the draft and resumes it as a session.
    pub fn resume(&self) -> SyncResult<Option<Session>> {
        Ok(self.load()?.map(Session::resume))
    }

    /// Deletes the draft.
    pub fn clear(&self) -> SyncResult<()> {
        self.store.remove(&self.key)?;
        Ok(())
    }
}
