//! Lock-screen style progress updates for an in-progress session.
//!
//! [`LiveStatusTicker`] samples a shared [`Session`] on a fixed interval and
//! pushes a [`LiveStatus`] to a [`LiveStatusSink`]. Stopping the ticker pushes
//! a terminal [`LiveStatusUpdate::Complete`].

use crate::machine::Session;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

/// Summary of where the user is in the workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatus {
    /// Session start in milliseconds since the Unix epoch.
    pub started_at_timestamp: i64,
    /// Workout title.
    pub workout_title: String,
    /// Name of the open exercise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_exercise_name: Option<String>,
    /// `Set i of n` for the open exercise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_label: Option<String>,
    /// Summary of the set before the cursor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_set_label: Option<String>,
}

impl LiveStatus {
    /// Samples the session.
    pub fn from_session(session: &Session) -> Self {
        let snapshot = session.snapshot();
        let open = session
            .open_exercise_id()
            .and_then(|id| Some((session.workout().exercise(id)?, snapshot.exercise(id)?)));

        let (current_exercise_name, set_label, previous_set_label) = match open {
            Some((we, state)) => {
                let cursor = state.current_set_index();
                (
                    Some(we.exercise.name.clone()),
                    Some(format!("Set {} of {}", cursor + 1, state.set_count())),
                    cursor.checked_sub(1).and_then(|prev| state.set_summary(prev)),
                )
            }
            None => (None, None, None),
        };

        Self {
            started_at_timestamp: snapshot.started_at().timestamp_millis(),
            workout_title: session.workout().title.clone(),
            current_exercise_name,
            set_label,
            previous_set_label,
        }
    }
}

/// What the sink receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum LiveStatusUpdate {
    /// The session is running.
    Active(LiveStatus),
    /// The session ended; clear the display.
    Complete,
}

/// Receives live-status updates.
pub trait LiveStatusSink: Send + Sync {
    /// Publishes one update. Must not block.
    fn push(&self, update: LiveStatusUpdate);
}

/// Ticker configuration.
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// Time between updates.
    pub interval: Duration,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

impl TickerConfig {
    /// Sets the update interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Background task pushing live status for a session.
///
/// Dropping the ticker cancels the task without a terminal update; call
/// [`LiveStatusTicker::stop`] to clear the display.
pub struct LiveStatusTicker {
    handle: Option<JoinHandle<()>>,
    sink: Arc<dyn LiveStatusSink>,
}

impl LiveStatusTicker {
    /// Spawns the ticker on the current tokio runtime. The first update is
    /// pushed immediately.
    pub fn start(
        session: Arc<RwLock<Session>>,
        sink: Arc<dyn LiveStatusSink>,
        config: TickerConfig,
    ) -> Self {
        let task_sink = Arc::clone(&sink);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(config.interval);
            loop {
                interval.tick().await;
                let status = LiveStatus::from_session(&session.read());
                task_sink.push(LiveStatusUpdate::Active(status));
            }
        });
        debug!("live status ticker started");
        Self {
            handle: Some(handle),
            sink,
        }
    }

    /// Cancels the task and pushes [`LiveStatusUpdate::Complete`].
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Cancellation is the expected outcome.
            let _ = handle.await;
        }
        self.sink.push(LiveStatusUpdate::Complete);
        debug!("live status ticker stopped");
    }
}

impl Drop for LiveStatusTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Exercise, ExerciseKind, TargetHints, Workout, WorkoutExercise};
    use crate::state::{SetPatch, StrengthSetPatch};
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        updates: Mutex<Vec<LiveStatusUpdate>>,
    }

    impl LiveStatusSink for RecordingSink {
        fn push(&self, update: LiveStatusUpdate) {
            self.updates.lock().push(update);
        }
    }

    fn session() -> Session {
        let workout = Workout::new("w1", "Leg day").with_exercise(
            WorkoutExercise::new("we1", Exercise::new("sq", "Squat", ExerciseKind::Strength))
                .with_targets(TargetHints::strength(3, 5, Some(100.0))),
        );
        Session::start(workout, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
    }

    #[test]
    fn status_describes_open_exercise() {
        let mut session = session();
        session
            .update_set("we1", 0, SetPatch::Strength(StrengthSetPatch::new("5", "100")))
            .unwrap();
        session.advance_to_next_set("we1").unwrap();

        let status = LiveStatus::from_session(&session);
        assert_eq!(status.workout_title, "Leg day");
        assert_eq!(status.current_exercise_name.as_deref(), Some("Squat"));
        assert_eq!(status.set_label.as_deref(), Some("Set 2 of 3"));
        assert_eq!(status.previous_set_label.as_deref(), Some("5 × 100"));
        assert_eq!(status.started_at_timestamp, 1_714_557_600_000);
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_value(LiveStatusUpdate::Active(LiveStatus::from_session(&session()))).unwrap();
        assert_eq!(json["state"], "active");
        assert_eq!(json["status"]["setLabel"], "Set 1 of 3");
        assert!(json["status"].get("previousSetLabel").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_then_completes() {
        let shared = Arc::new(RwLock::new(session()));
        let sink = Arc::new(RecordingSink::default());
        let ticker = LiveStatusTicker::start(
            Arc::clone(&shared),
            sink.clone(),
            TickerConfig::default(),
        );

        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(sink.updates.lock().len(), 3);

        ticker.stop().await;
        time::sleep(Duration::from_secs(5)).await;

        let updates = sink.updates.lock();
        assert_eq!(updates.len(), 4);
        assert_eq!(updates.last(), Some(&LiveStatusUpdate::Complete));
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_sees_session_changes() {
        let shared = Arc::new(RwLock::new(session()));
        let sink = Arc::new(RecordingSink::default());
        let _ticker = LiveStatusTicker::start(
            Arc::clone(&shared),
            sink.clone(),
            TickerConfig::default().with_interval(Duration::from_millis(200)),
        );
        time::sleep(Duration::from_millis(50)).await;

        {
            let mut session = shared.write();
            session
                .update_set("we1", 0, SetPatch::Strength(StrengthSetPatch::new("5", "100")))
                .unwrap();
            session.advance_to_next_set("we1").unwrap();
        }
        time::sleep(Duration::from_millis(200)).await;

        let updates = sink.updates.lock();
        let Some(LiveStatusUpdate::Active(last)) = updates.last() else {
            panic!("expected an active update");
        };
        assert_eq!(last.set_label.as_deref(), Some("Set 2 of 3"));
    }
}
