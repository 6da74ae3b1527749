//! Backend abstraction.

use crate::identity::Identity;
use chrono::NaiveDate;
use liftsync_session::SaveRecord;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// A failed backend call. Only the message is known; callers classify it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    /// Message reported by the backend or the transport.
    pub message: String,
}

impl BackendError {
    /// Creates an error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The remote workout service.
///
/// `save_workout` must be idempotent by [`SaveRecord::idempotency_key`]:
/// saving the same key twice yields one history record and returns its id
/// both times.
pub trait WorkoutBackend: Send + Sync {
    /// Saves a finished workout and returns the history record id.
    fn save_workout(&self, identity: &Identity, record: &SaveRecord) -> Result<String, BackendError>;

    /// Increments the user's completed-workout count for a week.
    fn increment_weekly_count(&self, identity: &Identity, week_start: NaiveDate) -> Result<(), BackendError>;

    /// Asks the backend to evaluate achievements for a new history record.
    fn evaluate_achievements(&self, identity: &Identity, history_id: &str) -> Result<(), BackendError>;
}

/// An in-memory backend for tests.
///
/// Saves are deduplicated by idempotency key. Failures can be injected
/// globally or per key.
#[derive(Debug, Default)]
pub struct MockBackend {
    records: Mutex<BTreeMap<String, (String, SaveRecord)>>,
    failure: Mutex<Option<String>>,
    key_failures: Mutex<HashMap<String, String>>,
    secondary_failure: Mutex<Option<String>>,
    weekly: Mutex<Vec<NaiveDate>>,
    achievements: Mutex<Vec<String>>,
    save_calls: AtomicU64,
    next_id: AtomicU64,
}

impl MockBackend {
    /// Creates a backend that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every save fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    /// Makes saves for one key fail with `message`.
    pub fn fail_key(&self, key: impl Into<String>, message: impl Into<String>) {
        self.key_failures.lock().insert(key.into(), message.into());
    }

    /// Makes the secondary calls fail with `message`.
    pub fn fail_secondary(&self, message: impl Into<String>) {
        *self.secondary_failure.lock() = Some(message.into());
    }

    /// Clears every injected failure.
    pub fn succeed(&self) {
        *self.failure.lock() = None;
        self.key_failures.lock().clear();
        *self.secondary_failure.lock() = None;
    }

    /// Number of distinct history records.
    pub fn history_count(&self) -> usize {
        self.records.lock().len()
    }

    /// Stored records, ordered by idempotency key.
    pub fn saved_records(&self) -> Vec<SaveRecord> {
        self.records.lock().values().map(|(_, r)| r.clone()).collect()
    }

    /// Total `save_workout` calls, including failed and duplicate ones.
    pub fn save_calls(&self) -> u64 {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Weeks passed to `increment_weekly_count`.
    pub fn weekly_increments(&self) -> Vec<NaiveDate> {
        self.weekly.lock().clone()
    }

    /// History ids passed to `evaluate_achievements`.
    pub fn achievement_triggers(&self) -> Vec<String> {
        self.achievements.lock().clone()
    }

    fn secondary(&self) -> Result<(), BackendError> {
        match self.secondary_failure.lock().as_ref() {
            Some(message) => Err(BackendError::new(message.as_str())),
            None => Ok(()),
        }
    }
}

impl WorkoutBackend for MockBackend {
    fn save_workout(&self, _identity: &Identity, record: &SaveRecord) -> Result<String, BackendError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().as_ref() {
            return Err(BackendError::new(message.as_str()));
        }
        if let Some(message) = self.key_failures.lock().get(&record.idempotency_key) {
            return Err(BackendError::new(message.as_str()));
        }

        let mut records = self.records.lock();
        let (id, _) = records
            .entry(record.idempotency_key.clone())
            .or_insert_with(|| {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                (format!("history-{n}"), record.clone())
            });
        Ok(id.clone())
    }

    fn increment_weekly_count(&self, _identity: &Identity, week_start: NaiveDate) -> Result<(), BackendError> {
        self.secondary()?;
        self.weekly.lock().push(week_start);
        Ok(())
    }

    fn evaluate_achievements(&self, _identity: &Identity, history_id: &str) -> Result<(), BackendError> {
        self.secondary()?;
        self.achievements.lock().push(history_id.to_string());
        Ok(())
    }
}
