//! Property-based test generators using proptest.
//!
//! Provides strategies for workout templates, raw set entries and
//! sequences of session operations.

use liftsync_session::{
    CardioSetPatch, Exercise, ExerciseKind, Session, SessionResult, SetPatch, StrengthSetPatch,
    TargetHints, Workout, WorkoutExercise,
};
use proptest::prelude::*;

/// Strategy for raw text a user might type into a set field: blanks,
/// integers, decimals with either separator, and junk.
pub fn entry_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        2 => Just(String::new()),
        1 => Just("   ".to_string()),
        4 => "[0-9]{1,3}",
        2 => "[0-9]{1,3}[.,][0-9]{1,2}",
        1 => "[a-z]{1,5}",
    ]
}

/// Strategy for a single template exercise.
pub fn workout_exercise_strategy(index: usize) -> impl Strategy<Value = WorkoutExercise> {
    (
        any::<bool>(),
        prop::option::of(prop_oneof![Just("g1"), Just("g2")]),
        prop::option::of(0u32..4),
        any::<bool>(),
        0u32..5,
    )
        .prop_map(move |(is_cardio, group, superset_index, eligible, sets)| {
            let id = format!("we{index}");
            let kind = if is_cardio {
                ExerciseKind::Cardio
            } else {
                ExerciseKind::Strength
            };
            let mut we = WorkoutExercise::new(id.clone(), Exercise::new(format!("lib-{id}"), id, kind));
            if kind == ExerciseKind::Strength {
                we = we.with_targets(TargetHints::strength(sets, 8, None));
            }
            if let Some(group) = group {
                we.superset_group = Some(group.to_string());
                we.superset_index = superset_index;
            }
            we.is_dropset_eligible = eligible;
            we
        })
}

/// Strategy for a workout of 1 to `max_exercises` exercises.
pub fn workout_strategy(max_exercises: usize) -> impl Strategy<Value = Workout> {
    (1..=max_exercises.max(1)).prop_flat_map(|count| {
        (0..count)
            .map(workout_exercise_strategy)
            .collect::<Vec<_>>()
            .prop_map(|exercises| {
                exercises
                    .into_iter()
                    .fold(Workout::new("w-prop", "Generated"), Workout::with_exercise)
            })
    })
}

/// One user action against a session. Indices are reduced modulo the
/// number of exercises or sets when applied.
#[derive(Debug, Clone)]
pub enum SessionOp {
    /// Type into a set.
    Update {
        /// Exercise position.
        exercise: usize,
        /// Set index.
        set: usize,
        /// First field (reps or distance).
        first: String,
        /// Second field (weight or time).
        second: String,
    },
    /// Advance to the next set.
    Advance(usize),
    /// Go back one set.
    Retreat(usize),
    /// Complete an exercise.
    Complete(usize),
    /// Focus an exercise.
    Open(usize),
    /// Toggle drop mode.
    DropMode(usize, bool),
}

/// Strategy for session operations.
pub fn session_op_strategy() -> impl Strategy<Value = SessionOp> {
    prop_oneof![
        4 => (any::<usize>(), 0usize..6, entry_strategy(), entry_strategy()).prop_map(
            |(exercise, set, first, second)| SessionOp::Update { exercise, set, first, second }
        ),
        3 => any::<usize>().prop_map(SessionOp::Advance),
        1 => any::<usize>().prop_map(SessionOp::Retreat),
        1 => any::<usize>().prop_map(SessionOp::Complete),
        1 => any::<usize>().prop_map(SessionOp::Open),
        1 => (any::<usize>(), any::<bool>()).prop_map(|(e, on)| SessionOp::DropMode(e, on)),
    ]
}

/// Strategy for a sequence of operations.
pub fn session_op_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<SessionOp>> {
    prop::collection::vec(session_op_strategy(), min_ops..max_ops)
}

/// Applies an operation, returning the machine's verdict.
pub fn apply_op(session: &mut Session, op: &SessionOp) -> SessionResult<()> {
    let ids: Vec<String> = session.workout().exercises.iter().map(|we| we.id.clone()).collect();
    let pick = |i: usize| ids[i % ids.len()].clone();

    match op {
        SessionOp::Update {
            exercise,
            set,
            first,
            second,
        } => {
            let we_id = pick(*exercise);
            let state = session.exercise(&we_id)?;
            let index = set % state.set_count();
            let patch = match state.kind() {
                ExerciseKind::Strength => SetPatch::Strength(StrengthSetPatch::new(first, second)),
                ExerciseKind::Cardio => SetPatch::Cardio(CardioSetPatch::new(first, second)),
            };
            session.update_set(&we_id, index, patch)
        }
        SessionOp::Advance(i) => session.advance_to_next_set(&pick(*i)),
        SessionOp::Retreat(i) => session.retreat_to_previous_set(&pick(*i)),
        SessionOp::Complete(i) => session.complete_exercise(&pick(*i)).map(|_| ()),
        SessionOp::Open(i) => session.open_exercise(&pick(*i)),
        SessionOp::DropMode(i, on) => session.set_drop_mode(&pick(*i), *on),
    }
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
