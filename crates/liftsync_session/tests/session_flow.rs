//! Integration tests for the session state machine and normalizer.

use liftsync_session::{
    column_label, normalize, SessionError, SetPatch, StrengthSetPatch, SupersetInfo,
    ValidationError, WorkoutExercise,
};
use liftsync_testkit::prelude::*;
use proptest::prelude::*;

fn log(session: &mut liftsync_session::Session, we_id: &str) {
    let index = session.exercise(we_id).unwrap().current_set_index();
    session
        .update_set(we_id, index, SetPatch::Strength(StrengthSetPatch::new("10", "40")))
        .unwrap();
}

#[test]
fn rotation_cycles_through_every_member() {
    let mut session = start(superset_workout(3));
    let mut visited = Vec::new();

    for _ in 0..6 {
        let open = session.open_exercise_id().unwrap().to_string();
        visited.push(open.clone());
        log(&mut session, &open);
        session.advance_to_next_set(&open).unwrap();
    }

    assert_eq!(visited, vec!["ss0", "ss1", "ss2", "ss0", "ss1", "ss2"]);
    for id in ["ss0", "ss1", "ss2"] {
        assert_eq!(session.exercise(id).unwrap().current_set_index(), 2);
    }
}

#[test]
fn rotation_skips_completed_members() {
    let mut session = start(superset_workout(3));
    log(&mut session, "ss1");
    session.complete_exercise("ss1").unwrap();

    session.open_exercise("ss0").unwrap();
    log(&mut session, "ss0");
    session.advance_to_next_set("ss0").unwrap();
    assert_eq!(session.open_exercise_id(), Some("ss2"));

    log(&mut session, "ss2");
    session.advance_to_next_set("ss2").unwrap();
    assert_eq!(session.open_exercise_id(), Some("ss0"));
}

#[test]
fn last_member_completion_moves_past_group() {
    let mut session = logged_session(superset_workout(2));
    assert_eq!(session.complete_exercise("ss0").unwrap().as_deref(), Some("ss1"));
    assert_eq!(
        session.complete_exercise("ss1").unwrap().as_deref(),
        Some("finisher")
    );
    assert_eq!(completed_ids(&session), vec!["ss0", "ss1"]);
}

#[test]
fn blank_advance_is_rejected_without_mutation() {
    let mut session = start(push_day());
    let before = session.snapshot().clone();

    let err = session.advance_to_next_set("bench").unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::EmptySet { .. })
    ));
    assert_eq!(session.snapshot(), &before);
}

#[test]
fn labels_follow_first_appearance() {
    let exercises: Vec<WorkoutExercise> = vec![
        strength("a1", "A1", 1).in_superset("A-group", 0),
        strength("solo", "Solo", 1),
        strength("a2", "A2", 1).in_superset("A-group", 1),
        strength("b1", "B1", 1).in_superset("B-group", 0),
    ];
    let info = SupersetInfo::from_exercises(&exercises);

    assert_eq!(info.label("A-group"), Some("A"));
    assert_eq!(info.label("B-group"), Some("B"));
    assert_eq!(info.label_for_exercise("solo"), None);
    assert_eq!(column_label(27), "AB");
}

#[test]
fn normalizer_omits_blank_exercises() {
    let mut session = start(push_day());
    log(&mut session, "ohp");

    let record = normalize(session.snapshot(), 100, fixed_time(), "k", None);
    assert_eq!(record.exercise_count(), 1);
    assert_eq!(record.exercise_history[0].workout_exercise_id.as_deref(), Some("ohp"));
    assert_eq!(record.exercise_history[0].order_index, 1);
}

#[test]
fn cardio_completion_feeds_duration_bonus() {
    let mut session = logged_session(cardio_workout());
    session.complete_exercise("run").unwrap();
    session.complete_exercise("row").unwrap();
    assert_eq!(session.snapshot().cardio_time_bonus_seconds(), 1200);

    assert_eq!(
        session.complete_exercise("run"),
        Err(SessionError::AlreadyCompleted("run".into()))
    );
    let snapshot = session.finish();
    let duration = snapshot.duration_seconds(fixed_time());
    assert_eq!(duration, 1200);

    let record = normalize(&snapshot, duration, fixed_time(), "k", None);
    assert_eq!(record.duration_seconds, 1200);
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn invariants_hold_after_any_operations(
        workout in workout_strategy(5),
        ops in session_op_sequence_strategy(1, 40),
    ) {
        let mut session = start(workout);
        for op in &ops {
            let before = session.snapshot().clone();
            if apply_op(&mut session, op).is_err() {
                prop_assert_eq!(session.snapshot(), &before);
            }

            let mut open = 0;
            for (_, state) in session.snapshot().exercises() {
                prop_assert!(state.set_count() >= 1);
                prop_assert!(state.current_set_index() < state.set_count());
                if state.is_open() {
                    open += 1;
                }
            }
            prop_assert!(open <= 1);
        }
    }

    #[test]
    fn normalized_sets_are_numbered_contiguously(
        workout in workout_strategy(4),
        ops in session_op_sequence_strategy(1, 40),
    ) {
        let mut session = start(workout);
        for op in &ops {
            let _ = apply_op(&mut session, op);
        }
        let record = normalize(session.snapshot(), 0, fixed_time(), "k", None);

        for entry in &record.exercise_history {
            prop_assert!(!entry.sets.is_empty());
            let mut expected = 1;
            for set in &entry.sets {
                prop_assert!(set.set_number == expected || set.set_number == expected + 1);
                expected = set.set_number;
            }
            prop_assert_eq!(entry.sets[0].set_number, 1);
        }
    }
}
