//! Workout, session and engine fixtures.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use liftsync_session::{
    CardioSetPatch, Exercise, ExerciseKind, ExerciseState, Session, SetPatch, StrengthSetPatch,
    TargetHints, Workout, WorkoutExercise,
};
use liftsync_storage::{FileStore, InMemoryStore, KeyValueStore};
use liftsync_sync_engine::{Identity, MockBackend, StaticIdentity, SyncConfig, SyncEngine};
use std::sync::Arc;
use tempfile::TempDir;

/// A fixed, timezone-free instant: Wednesday 2024-05-01 10:00 UTC.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
        .single()
        .expect("valid fixed time")
}

/// A strength exercise with `sets` target sets of 10 reps.
pub fn strength(id: &str, name: &str, sets: u32) -> WorkoutExercise {
    WorkoutExercise::new(
        id,
        Exercise::new(format!("lib-{id}"), name, ExerciseKind::Strength),
    )
    .with_targets(TargetHints::strength(sets, 10, None))
}

/// A cardio exercise.
pub fn cardio(id: &str, name: &str) -> WorkoutExercise {
    WorkoutExercise::new(id, Exercise::new(format!("lib-{id}"), name, ExerciseKind::Cardio))
}

/// Three plain strength exercises.
pub fn push_day() -> Workout {
    Workout::new("w-push", "Push day")
        .with_exercise(strength("bench", "Bench press", 3))
        .with_exercise(strength("ohp", "Overhead press", 3))
        .with_exercise(strength("dips", "Dips", 2))
}

/// One superset group of `size` exercises, followed by a plain exercise.
pub fn superset_workout(size: usize) -> Workout {
    let mut workout = Workout::new("w-superset", "Superset day");
    for i in 0..size {
        let index = u32::try_from(i).expect("superset size fits u32");
        workout = workout.with_exercise(
            strength(&format!("ss{i}"), &format!("Superset {i}"), 3).in_superset("g1", index),
        );
    }
    workout.with_exercise(strength("finisher", "Finisher", 2))
}

/// A single drop-set eligible exercise.
pub fn dropset_workout() -> Workout {
    Workout::new("w-drop", "Drop sets").with_exercise(strength("curl", "Curl", 2).dropset_eligible())
}

/// Running then rowing.
pub fn cardio_workout() -> Workout {
    Workout::new("w-cardio", "Conditioning")
        .with_exercise(cardio("run", "Run"))
        .with_exercise(cardio("row", "Row"))
}

/// Starts a session at [`fixed_time`].
pub fn start(workout: Workout) -> Session {
    Session::start(workout, fixed_time())
}

/// Fills every set of every exercise with data.
pub fn log_every_set(session: &mut Session) {
    let plan: Vec<(String, ExerciseKind, usize)> = session
        .snapshot()
        .exercises()
        .map(|(we, state)| (we.id.clone(), state.kind(), state.set_count()))
        .collect();
    for (we_id, kind, sets) in plan {
        for index in 0..sets {
            let patch = match kind {
                ExerciseKind::Strength => SetPatch::Strength(StrengthSetPatch::new("10", "50")),
                ExerciseKind::Cardio => SetPatch::Cardio(CardioSetPatch::new("2.5", "600")),
            };
            session
                .update_set(&we_id, index, patch)
                .expect("fixture patch applies");
        }
    }
}

/// Starts a session and logs every set.
pub fn logged_session(workout: Workout) -> Session {
    let mut session = start(workout);
    log_every_set(&mut session);
    session
}

/// Ids of exercises that are completed.
pub fn completed_ids(session: &Session) -> Vec<String> {
    session
        .snapshot()
        .exercises()
        .filter(|(_, state)| ExerciseState::is_completed(state))
        .map(|(we, _)| we.id.clone())
        .collect()
}

/// Engine type used by the fixtures.
pub type MockEngine = SyncEngine<MockBackend, StaticIdentity>;

/// A sync engine over a mock backend with automatic cleanup.
pub struct TestEngine {
    /// The engine.
    pub engine: MockEngine,
    /// Store shared with the engine.
    pub store: Arc<dyn KeyValueStore>,
    _temp_dir: Option<TempDir>,
}

impl TestEngine {
    /// Signed-in engine over an in-memory store.
    pub fn memory() -> Self {
        Self::build(Arc::new(InMemoryStore::new()), None, true)
    }

    /// Signed-out engine over an in-memory store.
    pub fn signed_out() -> Self {
        Self::build(Arc::new(InMemoryStore::new()), None, false)
    }

    /// Signed-in engine over a file store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(temp_dir.path()).expect("Failed to open file store");
        Self::build(Arc::new(store), Some(temp_dir), true)
    }

    fn build(store: Arc<dyn KeyValueStore>, temp_dir: Option<TempDir>, signed_in: bool) -> Self {
        let identity = if signed_in {
            StaticIdentity::signed_in(test_identity())
        } else {
            StaticIdentity::signed_out()
        };
        let config = SyncConfig::new("http://localhost")
            .with_utc_offset(FixedOffset::east_opt(0).expect("zero offset"));
        Self {
            engine: SyncEngine::new(config, Arc::clone(&store), MockBackend::new(), identity),
            store,
            _temp_dir: temp_dir,
        }
    }
}

impl std::ops::Deref for TestEngine {
    type Target = MockEngine;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}

/// The identity used by [`TestEngine`].
pub fn test_identity() -> Identity {
    Identity::new("user-1", "token-1")
}
