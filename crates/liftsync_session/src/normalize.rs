//! Turns a finished session into a [`SaveRecord`].

use crate::model::WorkoutExercise;
use crate::record::{ExerciseHistoryEntry, SaveRecord, TargetUpdate, WireSet};
use crate::state::{parse_count, parse_decimal, CardioState, ExerciseState, SessionSnapshot, StrengthState};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Builds the canonical save record for a finished session.
///
/// Exercises are emitted in workout order, once each, and only if at least
/// one set has data. Blank sets are dropped and the remaining sets are
/// numbered from 1. Unparseable numeric entries are sent as absent.
///
/// Target suggestions are attached for template-bound exercises only.
pub fn normalize(
    snapshot: &SessionSnapshot,
    duration_seconds: u64,
    completed_at: DateTime<Utc>,
    idempotency_key: &str,
    plan_workout_id: Option<&str>,
) -> SaveRecord {
    let mut seen = HashSet::new();
    let mut exercise_history = Vec::new();
    let mut workout_exercise_target_updates = Vec::new();

    for (position, we) in snapshot.workout().exercises.iter().enumerate() {
        if !seen.insert(we.id.as_str()) {
            continue;
        }
        let Some(state) = snapshot.exercise(&we.id) else {
            continue;
        };
        if !state.has_logged_sets() {
            continue;
        }

        let (sets, is_dropset) = match state {
            ExerciseState::Strength(s) => (strength_sets(s), s.drop_mode()),
            ExerciseState::Cardio(c) => (cardio_sets(c), false),
        };

        if we.is_template_bound() {
            workout_exercise_target_updates.push(targets(we, state, &sets));
        }

        exercise_history.push(ExerciseHistoryEntry {
            exercise_id: we.exercise.id.clone(),
            order_index: u32::try_from(position).unwrap_or(u32::MAX),
            notes: state.notes().to_string(),
            workout_exercise_id: we.is_template_bound().then(|| we.id.clone()),
            is_dropset,
            superset_group: we.superset_group.clone(),
            superset_index: we.superset_index,
            sets,
        });
    }

    SaveRecord {
        idempotency_key: idempotency_key.to_string(),
        workout_id: snapshot.workout().id.clone(),
        completed_at,
        duration_seconds,
        notes: snapshot.workout_notes().to_string(),
        plan_workout_id: plan_workout_id.map(str::to_string),
        exercise_history,
        workout_exercise_target_updates,
    }
}

fn strength_sets(state: &StrengthState) -> Vec<WireSet> {
    let mut out = Vec::new();
    let mut set_number = 0;
    for set in state.sets().iter().filter(|s| s.has_data()) {
        set_number += 1;
        let drops: Vec<_> = if state.drop_mode() {
            set.populated_drops().map(|(_, row)| row).collect()
        } else {
            Vec::new()
        };

        if drops.is_empty() {
            out.push(WireSet {
                set_number,
                reps: parse_count(&set.reps),
                weight: parse_decimal(&set.weight),
                ..WireSet::default()
            });
            continue;
        }
        for (drop_index, row) in (0u32..).zip(drops) {
            out.push(WireSet {
                set_number,
                drop_index,
                reps: parse_count(&row.reps),
                weight: parse_decimal(&row.weight),
                ..WireSet::default()
            });
        }
    }
    out
}

fn cardio_sets(state: &CardioState) -> Vec<WireSet> {
    (1u32..)
        .zip(state.sets().iter().filter(|s| s.has_data()))
        .map(|(set_number, set)| WireSet {
            set_number,
            time_seconds: parse_count(&set.time_seconds),
            distance: parse_decimal(&set.distance),
            ..WireSet::default()
        })
        .collect()
}

fn targets(we: &WorkoutExercise, state: &ExerciseState, sets: &[WireSet]) -> TargetUpdate {
    let mut update = TargetUpdate {
        id: we.id.clone(),
        ..TargetUpdate::default()
    };
    match state {
        ExerciseState::Strength(_) => {
            update.target_sets = u32::try_from(state.logged_set_count()).ok();
            update.target_reps = sets.iter().rev().filter_map(|s| s.reps).find(|r| *r > 0);
            update.target_weight = sets
                .iter()
                .filter_map(|s| s.weight)
                .filter(|w| *w > 0.0)
                .reduce(f64::max);
        }
        ExerciseState::Cardio(_) => {
            update.target_distance = sets
                .iter()
                .rev()
                .filter_map(|s| s.distance)
                .find(|d| *d > 0.0);
            update.target_time_seconds = sets
                .iter()
                .rev()
                .filter_map(|s| s.time_seconds)
                .find(|t| *t > 0);
        }
    }
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Session;
    use crate::model::{Exercise, ExerciseKind, TargetHints, Workout};
    use crate::state::{CardioSetPatch, DropPatch, SetPatch, StrengthSetPatch};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn strength(id: &str) -> WorkoutExercise {
        WorkoutExercise::new(id, Exercise::new(format!("ex-{id}"), id, ExerciseKind::Strength))
            .with_targets(TargetHints::strength(3, 10, None))
    }

    fn cardio(id: &str) -> WorkoutExercise {
        WorkoutExercise::new(id, Exercise::new(format!("ex-{id}"), id, ExerciseKind::Cardio))
    }

    fn session(exercises: Vec<WorkoutExercise>) -> Session {
        let workout = exercises
            .into_iter()
            .fold(Workout::new("w1", "Test"), Workout::with_exercise);
        Session::start(workout, at())
    }

    fn set(session: &mut Session, we_id: &str, index: usize, reps: &str, weight: &str) {
        session
            .update_set(we_id, index, SetPatch::Strength(StrengthSetPatch::new(reps, weight)))
            .unwrap();
    }

    #[test]
    fn skips_blank_exercises_and_sets() {
        let mut s = session(vec![strength("a"), strength("b")]);
        set(&mut s, "a", 0, "10", "50");
        set(&mut s, "a", 2, "8", "55");

        let record = normalize(s.snapshot(), 600, at(), "key", None);

        assert_eq!(record.exercise_count(), 1);
        let entry = &record.exercise_history[0];
        assert_eq!(entry.workout_exercise_id.as_deref(), Some("a"));
        let numbers: Vec<u32> = entry.sets.iter().map(|s| s.set_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(entry.sets[1].reps, Some(8));
        assert_eq!(record.idempotency_key, "key");
    }

    #[test]
    fn strength_targets() {
        let mut s = session(vec![strength("a")]);
        set(&mut s, "a", 0, "10", "60");
        set(&mut s, "a", 1, "8", "70");
        set(&mut s, "a", 2, "0", "65");

        let record = normalize(s.snapshot(), 600, at(), "key", Some("plan-1"));
        let update = &record.workout_exercise_target_updates[0];

        assert_eq!(update.id, "a");
        assert_eq!(update.target_sets, Some(3));
        assert_eq!(update.target_reps, Some(8));
        assert_eq!(update.target_weight, Some(70.0));
        assert_eq!(record.plan_workout_id.as_deref(), Some("plan-1"));
    }

    #[test]
    fn drop_sets_emit_one_row_per_populated_drop() {
        let mut s = session(vec![strength("d").dropset_eligible()]);
        s.set_drop_mode("d", true).unwrap();
        s.update_drop("d", 0, 0, DropPatch::new("10", "100")).unwrap();
        s.add_drop("d", 0).unwrap();
        s.add_drop("d", 0).unwrap();
        s.update_drop("d", 0, 1, DropPatch::new("", "")).unwrap();
        s.update_drop("d", 0, 2, DropPatch::new("8", "80")).unwrap();

        let record = normalize(s.snapshot(), 60, at(), "key", None);
        let entry = &record.exercise_history[0];

        assert!(entry.is_dropset);
        assert_eq!(entry.sets.len(), 2);
        assert_eq!(entry.sets[0].drop_index, 0);
        assert_eq!(entry.sets[1].drop_index, 1);
        assert_eq!(entry.sets[1].set_number, 1);
        assert_eq!(record.workout_exercise_target_updates[0].target_weight, Some(100.0));
    }

    #[test]
    fn cardio_targets_scan_independently() {
        let mut s = session(vec![cardio("run")]);
        s.update_set("run", 0, SetPatch::Cardio(CardioSetPatch::new("5", "1500")))
            .unwrap();
        s.advance_to_next_set("run").unwrap();
        s.update_set("run", 1, SetPatch::Cardio(CardioSetPatch::new("", "600")))
            .unwrap();

        let record = normalize(s.snapshot(), 60, at(), "key", None);
        let update = &record.workout_exercise_target_updates[0];

        assert_eq!(update.target_time_seconds, Some(600));
        assert_eq!(update.target_distance, Some(5.0));
        assert_eq!(record.exercise_history[0].sets[1].distance, None);
    }

    #[test]
    fn ad_hoc_exercises_get_no_targets() {
        let mut s = session(vec![strength("a")]);
        s.add_exercise(strength("extra").ad_hoc()).unwrap();
        set(&mut s, "extra", 0, "12", "20");

        let record = normalize(s.snapshot(), 60, at(), "key", None);

        assert_eq!(record.exercise_count(), 1);
        assert!(record.exercise_history[0].workout_exercise_id.is_none());
        assert_eq!(record.exercise_history[0].order_index, 1);
        assert!(record.workout_exercise_target_updates.is_empty());
    }

    #[test]
    fn unparseable_text_is_absent() {
        let mut s = session(vec![strength("a")]);
        set(&mut s, "a", 0, "lots", "heavy");

        let record = normalize(s.snapshot(), 60, at(), "key", None);
        let wire = &record.exercise_history[0].sets[0];

        assert_eq!(wire.reps, None);
        assert_eq!(wire.weight, None);
        assert_eq!(record.workout_exercise_target_updates[0].target_reps, None);
    }

    #[test]
    fn duplicate_template_rows_emit_once() {
        let mut s = session(vec![strength("a")]);
        set(&mut s, "a", 0, "5", "5");
        let mut snapshot = s.finish();
        let dup = snapshot.workout().exercises[0].clone();
        snapshot.workout_mut().exercises.push(dup);

        let record = normalize(&snapshot, 60, at(), "key", None);
        assert_eq!(record.exercise_count(), 1);
    }
}
