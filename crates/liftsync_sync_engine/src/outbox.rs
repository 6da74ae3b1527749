//! The persisted outbox of pending saves.
//!
//! The whole queue lives as one JSON array under a single store key and is
//! rewritten on every change. Every read-modify-write runs under the
//! outbox lock, so an enqueue that lands while a drain is in flight is
//! merged rather than overwritten.

use crate::error::{SyncError, SyncResult};
use crate::job::PendingJob;
use liftsync_storage::KeyValueStore;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// What a drain cycle did to the jobs it read.
#[derive(Debug, Default)]
pub(crate) struct DrainChanges {
    /// Keys of jobs the backend accepted.
    pub consumed: HashSet<String>,
    /// Jobs that failed and stay queued, with updated attempt counts.
    pub updated: Vec<PendingJob>,
    /// Jobs that exhausted their attempts.
    pub dead: Vec<PendingJob>,
}

/// Durable FIFO of [`PendingJob`]s plus the dead-letter list.
pub struct Outbox {
    store: Arc<dyn KeyValueStore>,
    key: String,
    dead_letter_key: String,
    lock: Mutex<()>,
}

impl Outbox {
    /// Opens the outbox stored under `key`, with dead letters under
    /// `dead_letter_key`.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        dead_letter_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            dead_letter_key: dead_letter_key.into(),
            lock: Mutex::new(()),
        }
    }

    /// All pending jobs, oldest first. Corrupt content reads as empty.
    pub fn jobs(&self) -> SyncResult<Vec<PendingJob>> {
        let _guard = self.lock.lock();
        self.read(&self.key)
    }

    /// Number of pending jobs.
    pub fn len(&self) -> SyncResult<usize> {
        Ok(self.jobs()?.len())
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> SyncResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Finds a pending job by key.
    pub fn find(&self, idempotency_key: &str) -> SyncResult<Option<PendingJob>> {
        Ok(self
            .jobs()?
            .into_iter()
            .find(|job| job.idempotency_key == idempotency_key))
    }

    /// Appends a job. A job whose key is already queued is not added twice.
    /// Returns false in that case.
    pub fn push(&self, job: PendingJob) -> SyncResult<bool> {
        let _guard = self.lock.lock();
        let mut jobs = self.read(&self.key)?;
        if jobs.iter().any(|j| j.idempotency_key == job.idempotency_key) {
            debug!(key = %job.idempotency_key, "job already queued");
            return Ok(false);
        }
        debug!(key = %job.idempotency_key, position = jobs.len(), "job queued");
        jobs.push(job);
        self.write(&self.key, &jobs)?;
        Ok(true)
    }

    /// Removes every pending job. Returns how many were removed.
    pub fn clear(&self) -> SyncResult<usize> {
        let _guard = self.lock.lock();
        let count = self.read(&self.key)?.len();
        self.store.remove(&self.key)?;
        Ok(count)
    }

    /// Jobs that exhausted their attempts, oldest first.
    pub fn dead_letters(&self) -> SyncResult<Vec<PendingJob>> {
        let _guard = self.lock.lock();
        self.read(&self.dead_letter_key)
    }

    /// Removes every dead letter. Returns how many were removed.
    pub fn clear_dead_letters(&self) -> SyncResult<usize> {
        let _guard = self.lock.lock();
        let count = self.read(&self.dead_letter_key)?.len();
        self.store.remove(&self.dead_letter_key)?;
        Ok(count)
    }

    /// Moves every dead letter back to the end of the queue with its attempt
    /// count reset. Returns how many were moved.
    pub fn requeue_dead_letters(&self) -> SyncResult<usize> {
        let _guard = self.lock.lock();
        let dead = self.read(&self.dead_letter_key)?;
        if dead.is_empty() {
            return Ok(0);
        }
        let mut jobs = self.read(&self.key)?;
        let count = dead.len();
        for mut job in dead {
            if jobs.iter().any(|j| j.idempotency_key == job.idempotency_key) {
                continue;
            }
            job.reset_attempts();
            jobs.push(job);
        }
        self.write(&self.key, &jobs)?;
        self.store.remove(&self.dead_letter_key)?;
        Ok(count)
    }

    /// Applies a drain cycle's outcome to the current queue.
    ///
    /// The queue is re-read under the lock: consumed and dead jobs are
    /// removed, failed jobs are replaced in place, and anything enqueued
    /// since the drain started is kept. Returns the new queue length.
    pub(crate) fn commit(&self, changes: DrainChanges) -> SyncResult<usize> {
        let _guard = self.lock.lock();
        let dead_keys: HashSet<&str> = changes
            .dead
            .iter()
            .map(|job| job.idempotency_key.as_str())
            .collect();
        let mut updated: HashMap<String, PendingJob> = changes
            .updated
            .into_iter()
            .map(|job| (job.idempotency_key.clone(), job))
            .collect();

        let remaining: Vec<PendingJob> = self
            .read(&self.key)?
            .into_iter()
            .filter(|job| {
                !changes.consumed.contains(&job.idempotency_key)
                    && !dead_keys.contains(job.idempotency_key.as_str())
            })
            .map(|job| updated.remove(&job.idempotency_key).unwrap_or(job))
            .collect();

        if !changes.dead.is_empty() {
            let mut dead = self.read(&self.dead_letter_key)?;
            dead.extend(changes.dead.iter().cloned());
            self.write(&self.dead_letter_key, &dead)?;
        }
        self.write(&self.key, &remaining)?;
        Ok(remaining.len())
    }

    fn read(&self, key: &str) -> SyncResult<Vec<PendingJob>> {
        let Some(bytes) = self.store.get(key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_slice(&bytes) {
            Ok(jobs) => Ok(jobs),
            Err(e) => {
                warn!(key, error = %e, "corrupt outbox content, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn write(&self, key: &str, jobs: &[PendingJob]) -> SyncResult<()> {
        let bytes = serde_json::to_vec(jobs).map_err(|e| SyncError::Codec(e.to_string()))?;
        self.store.put(key, &bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use liftsync_session::{Exercise, ExerciseKind, Session, Workout, WorkoutExercise};
    use liftsync_storage::InMemoryStore;

    fn job(key: &str) -> PendingJob {
        let workout = Workout::new("w1", "Push").with_exercise(WorkoutExercise::new(
            "we1",
            Exercise::new("bench", "Bench", ExerciseKind::Strength),
        ));
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        PendingJob::new(key, Session::start(workout, at).finish(), 60, at, None)
    }

    fn outbox() -> (Arc<InMemoryStore>, Outbox) {
        let store = Arc::new(InMemoryStore::new());
        let outbox = Outbox::new(store.clone(), "outbox.pending", "outbox.dead_letter");
        (store, outbox)
    }

    fn keys(jobs: &[PendingJob]) -> Vec<&str> {
        jobs.iter().map(|j| j.idempotency_key.as_str()).collect()
    }

    #[test]
    fn push_preserves_fifo_and_dedups() {
        let (_, outbox) = outbox();
        assert!(outbox.push(job("a")).unwrap());
        assert!(outbox.push(job("b")).unwrap());
        assert!(!outbox.push(job("a")).unwrap());

        assert_eq!(keys(&outbox.jobs().unwrap()), vec!["a", "b"]);
        assert!(outbox.find("b").unwrap().is_some());
    }

    #[test]
    fn corrupt_content_reads_empty() {
        let (store, outbox) = outbox();
        store.put("outbox.pending", b"{not json").unwrap();
        assert!(outbox.is_empty().unwrap());

        outbox.push(job("a")).unwrap();
        assert_eq!(outbox.len().unwrap(), 1);
    }

    #[test]
    fn commit_merges_concurrent_enqueue() {
        let (_, outbox) = outbox();
        outbox.push(job("a")).unwrap();
        outbox.push(job("b")).unwrap();
        outbox.push(job("c")).unwrap();

        // Drain reads a, b, c; "d" arrives while it runs.
        outbox.push(job("d")).unwrap();

        let mut failed = job("b");
        failed.record_failure("boom");
        let changes = DrainChanges {
            consumed: ["a".to_string()].into_iter().collect(),
            updated: vec![failed],
            dead: vec![job("c")],
        };
        assert_eq!(outbox.commit(changes).unwrap(), 2);

        let jobs = outbox.jobs().unwrap();
        assert_eq!(keys(&jobs), vec!["b", "d"]);
        assert_eq!(jobs[0].attempts, 1);
        assert_eq!(keys(&outbox.dead_letters().unwrap()), vec!["c"]);
    }

    #[test]
    fn dead_letters_can_be_requeued_or_cleared() {
        let (_, outbox) = outbox();
        let mut dead = job("x");
        dead.attempts = 5;
        dead.server_attempts = 5;
        outbox
            .commit(DrainChanges {
                dead: vec![dead],
                ..DrainChanges::default()
            })
            .unwrap();

        assert_eq!(outbox.requeue_dead_letters().unwrap(), 1);
        let requeued = &outbox.jobs().unwrap()[0];
        assert_eq!((requeued.attempts, requeued.server_attempts), (0, 0));
        assert!(outbox.dead_letters().unwrap().is_empty());

        assert_eq!(outbox.clear().unwrap(), 1);
        assert_eq!(outbox.clear_dead_letters().unwrap(), 0);
    }

    #[test]
    fn write_failures_surface() {
        let (store, outbox) = outbox();
        store.set_read_only(true);
        assert!(matches!(outbox.push(job("a")), Err(SyncError::Storage(_))));
    }
}
