//! Pending jobs held in the outbox.

use crate::classify::FailureClass;
use chrono::{DateTime, Utc};
use liftsync_session::{normalize, SaveRecord, SessionSnapshot};
use serde::{Deserialize, Serialize};

/// A finished session waiting to be saved.
///
/// The job carries the whole snapshot, so it can be normalized again on
/// every attempt without any other state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingJob {
    /// Key the backend deduplicates on. Never changes.
    pub idempotency_key: String,
    /// When the job was first queued.
    pub created_at: DateTime<Utc>,
    /// The finished session.
    pub snapshot: SessionSnapshot,
    /// Reported duration.
    pub duration_seconds: u64,
    /// Completion time.
    pub completed_at: DateTime<Utc>,
    /// Plan the workout belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_workout_id: Option<String>,
    /// Failed delivery attempts so far, of any class.
    #[serde(default)]
    pub attempts: u32,
    /// Attempts that failed with a server error. Drives telemetry and dead
    /// lettering; offline and signed-out stretches never count here.
    #[serde(default)]
    pub server_attempts: u32,
    /// Message of the most recent failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl PendingJob {
    /// Creates a job with no attempts.
    pub fn new(
        idempotency_key: impl Into<String>,
        snapshot: SessionSnapshot,
        duration_seconds: u64,
        completed_at: DateTime<Utc>,
        plan_workout_id: Option<String>,
    ) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            created_at: Utc::now(),
            snapshot,
            duration_seconds,
            completed_at,
            plan_workout_id,
            attempts: 0,
            server_attempts: 0,
            last_error: None,
        }
    }

    /// Builds the save record for this job, reusing its key.
    pub fn to_record(&self) -> SaveRecord {
        normalize(
            &self.snapshot,
            self.duration_seconds,
            self.completed_at,
            &self.idempotency_key,
            self.plan_workout_id.as_deref(),
        )
    }

    /// Records a failed attempt and returns its class.
    pub fn record_failure(&mut self, message: impl Into<String>) -> FailureClass {
        let message = message.into();
        let class = FailureClass::classify(&message);
        self.attempts = self.attempts.saturating_add(1);
        if class == FailureClass::Server {
            self.server_attempts = self.server_attempts.saturating_add(1);
        }
        self.last_error = Some(message);
        class
    }

    /// Clears the attempt counters, keeping the last error for display.
    pub fn reset_attempts(&mut self) {
        self.attempts = 0;
        self.server_attempts = 0;
    }

    /// Workout title, for listings.
    pub fn title(&self) -> &str {
        &self.snapshot.workout().title
    }
}
