//! The sync engine: submit, enqueue and drain.

use crate::backend::WorkoutBackend;
use crate::classify::FailureClass;
use crate::config::SyncConfig;
use crate::draft::DraftStore;
use crate::error::{SyncError, SyncResult};
use crate::identity::{Identity, IdentityProvider};
use crate::job::PendingJob;
use crate::outbox::{DrainChanges, Outbox};
use crate::telemetry::{FailureReport, TelemetrySink, TracingTelemetry};
use crate::week::week_start;
use chrono::{DateTime, Local, Utc};
use liftsync_session::{normalize, SaveRecord, SessionSnapshot};
use liftsync_storage::KeyValueStore;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of one drain cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Jobs the backend accepted.
    pub synced: usize,
    /// Jobs left in the outbox afterwards.
    pub remaining: usize,
    /// The cycle stopped because there is no usable identity.
    pub stopped_for_auth: bool,
    /// Class of the failure that halted the cycle, if one did.
    pub halted: Option<FailureClass>,
    /// Jobs moved to dead letters in this cycle.
    pub dead_lettered: usize,
    /// Failed save attempts in this cycle.
    pub failed: usize,
}

/// What happened to a submitted workout.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The backend stored the workout.
    Saved {
        /// History record id.
        history_id: String,
        /// The follow-up drain, if one ran.
        drained: Option<DrainSummary>,
    },
    /// The workout was queued for a later drain.
    Queued {
        /// The queued job.
        job: PendingJob,
        /// Why the direct save failed; `None` when no identity was available.
        reason: Option<SyncError>,
    },
}

impl SubmitOutcome {
    /// Returns true if the backend stored the workout.
    pub fn is_saved(&self) -> bool {
        matches!(self, SubmitOutcome::Saved { .. })
    }

    /// The idempotency key of a queued job.
    pub fn queued_key(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Queued { job, .. } => Some(&job.idempotency_key),
            SubmitOutcome::Saved { .. } => None,
        }
    }
}

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Completed drain cycles.
    pub drains_completed: u64,
    /// Queued jobs delivered by drains.
    pub jobs_synced: u64,
    /// Workouts saved directly by submit.
    pub direct_saves: u64,
    /// Failed save attempts.
    pub failures: u64,
    /// Jobs moved to dead letters.
    pub dead_lettered: u64,
    /// Last completed drain.
    pub last_drain_time: Option<Instant>,
    /// Last failure message.
    pub last_error: Option<String>,
}

struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Delivers finished workouts to the backend, queueing them while it is
/// unreachable.
pub struct SyncEngine<B: WorkoutBackend, I: IdentityProvider> {
    config: SyncConfig,
    backend: Arc<B>,
    identity: Arc<I>,
    telemetry: Arc<dyn TelemetrySink>,
    outbox: Outbox,
    drafts: DraftStore,
    draining: AtomicBool,
    stats: RwLock<SyncStats>,
}

impl<B: WorkoutBackend, I: IdentityProvider> SyncEngine<B, I> {
    /// Creates an engine persisting its queue in `store`.
    pub fn new(config: SyncConfig, store: Arc<dyn KeyValueStore>, backend: B, identity: I) -> Self {
        let outbox = Outbox::new(
            Arc::clone(&store),
            config.outbox_key.clone(),
            config.dead_letter_key.clone(),
        );
        let drafts = DraftStore::new(store, config.draft_key.clone());
        Self {
            config,
            backend: Arc::new(backend),
            identity: Arc::new(identity),
            telemetry: Arc::new(TracingTelemetry),
            outbox,
            drafts,
            draining: AtomicBool::new(false),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Replaces the telemetry sink.
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The identity provider.
    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// The outbox.
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// The draft store.
    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    /// Returns a copy of the statistics.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns true while a drain holds the single-flight guard.
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Queues a finished session under a fresh idempotency key.
    pub fn enqueue(
        &self,
        snapshot: SessionSnapshot,
        duration_seconds: u64,
        completed_at: DateTime<Utc>,
        plan_workout_id: Option<String>,
    ) -> SyncResult<PendingJob> {
        let key = Uuid::new_v4().to_string();
        self.enqueue_with_key(key, snapshot, duration_seconds, completed_at, plan_workout_id)
    }

    /// Queues a finished session under a caller-supplied key.
    pub fn enqueue_with_key(
        &self,
        idempotency_key: impl Into<String>,
        snapshot: SessionSnapshot,
        duration_seconds: u64,
        completed_at: DateTime<Utc>,
        plan_workout_id: Option<String>,
    ) -> SyncResult<PendingJob> {
        let job = PendingJob::new(
            idempotency_key,
            snapshot,
            duration_seconds,
            completed_at,
            plan_workout_id,
        );
        self.outbox.push(job.clone())?;
        Ok(job)
    }

    /// Saves a finished session, queueing it if the save is not possible.
    ///
    /// The session's draft is cleared once the workout is either saved or
    /// queued. After a successful save the outbox is drained when
    /// auto-drain is on.
    pub fn submit(
        &self,
        snapshot: SessionSnapshot,
        duration_seconds: u64,
        completed_at: DateTime<Utc>,
        plan_workout_id: Option<String>,
    ) -> SyncResult<SubmitOutcome> {
        let key = Uuid::new_v4().to_string();

        let Some(identity) = self.identity.current() else {
            info!(key = %key, "signed out, queueing workout");
            let job = self.enqueue_with_key(key, snapshot, duration_seconds, completed_at, plan_workout_id)?;
            self.clear_draft();
            return Ok(SubmitOutcome::Queued { job, reason: None });
        };

        let record = normalize(
            &snapshot,
            duration_seconds,
            completed_at,
            &key,
            plan_workout_id.as_deref(),
        );
        match self.backend.save_workout(&identity, &record) {
            Ok(history_id) => {
                info!(key = %key, history_id = %history_id, "workout saved");
                self.stats.write().direct_saves += 1;
                self.clear_draft();
                self.run_secondary(&identity, completed_at, &history_id);

                let drained = if self.config.auto_drain {
                    match self.drain() {
                        Ok(summary) => Some(summary),
                        Err(e) => {
                            debug!(error = %e, "follow-up drain skipped");
                            None
                        }
                    }
                } else {
                    None
                };
                Ok(SubmitOutcome::Saved { history_id, drained })
            }
            Err(e) => {
                let message = e.message;
                let error = SyncError::from_backend_message(message.as_str());
                warn!(key = %key, error = %error, "direct save failed, queueing workout");
                self.record_failure(&message);

                let mut job = PendingJob::new(key, snapshot, duration_seconds, completed_at, plan_workout_id);
                if job.record_failure(message.as_str()) == FailureClass::Server {
                    self.report_server_failure(&job, &record, &message);
                }
                self.outbox.push(job.clone())?;
                self.clear_draft();
                Ok(SubmitOutcome::Queued {
                    job,
                    reason: Some(error),
                })
            }
        }
    }

    /// Delivers queued jobs, oldest first.
    ///
    /// Authentication and network failures stop the cycle with the failed
    /// job still at the head. Server failures keep the job in place and the
    /// cycle moves on; once a job's server failures reach the attempt budget
    /// it moves to dead letters.
    ///
    /// # Errors
    ///
    /// [`SyncError::DrainInProgress`] if another drain is running, or a
    /// storage error if the outbox cannot be read or written.
    pub fn drain(&self) -> SyncResult<DrainSummary> {
        let _flight = DrainGuard::acquire(&self.draining).ok_or(SyncError::DrainInProgress)?;

        let Some(identity) = self.identity.current() else {
            let remaining = self.outbox.len()?;
            debug!(remaining, "signed out, drain skipped");
            return Ok(DrainSummary {
                remaining,
                stopped_for_auth: true,
                ..DrainSummary::default()
            });
        };

        let jobs = self.outbox.jobs()?;
        debug!(pending = jobs.len(), "drain started");

        let mut summary = DrainSummary::default();
        let mut changes = DrainChanges::default();

        for mut job in jobs {
            let record = job.to_record();
            let message = match self.backend.save_workout(&identity, &record) {
                Ok(history_id) => {
                    debug!(key = %job.idempotency_key, history_id = %history_id, "queued workout saved");
                    summary.synced += 1;
                    self.run_secondary(&identity, job.completed_at, &history_id);
                    changes.consumed.insert(job.idempotency_key);
                    continue;
                }
                Err(e) => e.message,
            };

            let class = job.record_failure(message.as_str());
            summary.failed += 1;
            self.record_failure(&message);

            if class.halts_drain() {
                warn!(
                    key = %job.idempotency_key,
                    attempts = job.attempts,
                    class = %class,
                    "drain halted"
                );
                summary.halted = Some(class);
                summary.stopped_for_auth = class == FailureClass::Authentication;
                changes.updated.push(job);
                break;
            }

            self.report_server_failure(&job, &record, &message);
            if job.server_attempts >= self.config.max_attempts {
                warn!(
                    key = %job.idempotency_key,
                    server_attempts = job.server_attempts,
                    "moving job to dead letters"
                );
                summary.dead_lettered += 1;
                changes.dead.push(job);
            } else {
                changes.updated.push(job);
            }
        }

        summary.remaining = self.outbox.commit(changes)?;

        {
            let mut stats = self.stats.write();
            stats.drains_completed += 1;
            stats.jobs_synced += summary.synced as u64;
            stats.dead_lettered += summary.dead_lettered as u64;
            stats.last_drain_time = Some(Instant::now());
        }

        info!(
            synced = summary.synced,
            remaining = summary.remaining,
            dead_lettered = summary.dead_lettered,
            halted = ?summary.halted,
            "drain finished"
        );
        Ok(summary)
    }

    fn run_secondary(&self, identity: &Identity, completed_at: DateTime<Utc>, history_id: &str) {
        let week = match self.config.utc_offset {
            Some(offset) => week_start(&completed_at.with_timezone(&offset)),
            None => week_start(&completed_at.with_timezone(&Local)),
        };
        if let Err(e) = self.backend.increment_weekly_count(identity, week) {
            warn!(history_id, error = %e, "weekly count update failed");
        }
        if let Err(e) = self.backend.evaluate_achievements(identity, history_id) {
            warn!(history_id, error = %e, "achievement evaluation failed");
        }
    }

    fn report_server_failure(&self, job: &PendingJob, record: &SaveRecord, message: &str) {
        if job.server_attempts <= self.config.telemetry_attempt_limit {
            self.telemetry.report(&failure_report(job, record, message));
        }
    }

    fn record_failure(&self, message: &str) {
        let mut stats = self.stats.write();
        stats.failures += 1;
        stats.last_error = Some(message.to_string());
    }

    fn clear_draft(&self) {
        if let Err(e) = self.drafts.clear() {
            warn!(error = %e, "failed to clear draft");
        }
    }
}

impl<B, I> SyncEngine<B, I>
where
    B: WorkoutBackend + 'static,
    I: IdentityProvider + 'static,
{
    /// Runs [`SyncEngine::drain`] on tokio's blocking pool.
    pub async fn drain_in_background(self: Arc<Self>) -> SyncResult<DrainSummary> {
        tokio::task::spawn_blocking(move || self.drain())
            .await
            .map_err(|e| SyncError::TaskFailed(e.to_string()))?
    }
}

fn failure_report(job: &PendingJob, record: &SaveRecord, message: &str) -> FailureReport {
    FailureReport {
        idempotency_key: job.idempotency_key.clone(),
        attempt: job.server_attempts,
        exercise_count: record.exercise_count(),
        set_count: record.set_count(),
        approximate_bytes: record.approximate_size(),
        message: message.to_string(),
    }
}
