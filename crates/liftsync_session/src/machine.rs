//! The session state machine.

use crate::error::{SessionError, SessionResult, ValidationError};
use crate::model::{ExerciseKind, Workout, WorkoutExercise};
use crate::state::{DropPatch, ExerciseState, SessionSnapshot, SetPatch, StrengthState};
use crate::superset::SupersetInfo;
use chrono::{DateTime, Utc};
use tracing::debug;

/// An in-progress workout session.
///
/// Owns the [`SessionSnapshot`] and the [`SupersetInfo`] derived from its
/// template. Every operation is synchronous and either applies completely
/// or leaves the state untouched.
///
/// # Invariants
///
/// - Every exercise has at least one set
/// - Every cursor points at an existing set
/// - At most one exercise is open
#[derive(Debug, Clone)]
pub struct Session {
    snapshot: SessionSnapshot,
    supersets: SupersetInfo,
}

impl Session {
    /// Starts a session: one blank set per target set (strength) or a single
    /// blank set (cardio) for every exercise, with the first one open.
    pub fn start(workout: Workout, started_at: DateTime<Utc>) -> Self {
        let supersets = SupersetInfo::from_exercises(&workout.exercises);
        let first = workout.exercises.first().map(|we| we.id.clone());
        let mut session = Self {
            snapshot: SessionSnapshot::initialize(workout, started_at),
            supersets,
        };
        if let Some(first) = first {
            session.open_only(&first);
        }
        session
    }

    /// Resumes a session from a snapshot read back from storage.
    pub fn resume(mut snapshot: SessionSnapshot) -> Self {
        snapshot.repair();
        let supersets = SupersetInfo::from_exercises(&snapshot.workout().exercises);
        Self {
            snapshot,
            supersets,
        }
    }

    /// The current state.
    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    /// The workout template.
    pub fn workout(&self) -> &Workout {
        self.snapshot.workout()
    }

    /// Superset tables for the current template.
    pub fn supersets(&self) -> &SupersetInfo {
        &self.supersets
    }

    /// State of one exercise.
    pub fn exercise(&self, we_id: &str) -> SessionResult<&ExerciseState> {
        self.snapshot
            .exercise(we_id)
            .ok_or_else(|| SessionError::UnknownExercise(we_id.to_string()))
    }

    /// The open exercise, if any.
    pub fn open_exercise_id(&self) -> Option<&str> {
        self.snapshot
            .exercises()
            .find(|(_, state)| state.is_open())
            .map(|(we, _)| we.id.as_str())
    }

    /// Merges `patch` into set `index`. No data validation happens here.
    pub fn update_set(&mut self, we_id: &str, index: usize, patch: SetPatch) -> SessionResult<()> {
        let state = self.exercise_mut(we_id)?;
        let len = state.set_count();
        let applied = match (state, patch) {
            (ExerciseState::Strength(s), SetPatch::Strength(p)) => s.apply_patch(index, p),
            (ExerciseState::Cardio(s), SetPatch::Cardio(p)) => s.apply_patch(index, p),
            (ExerciseState::Strength(_), SetPatch::Cardio(_)) => {
                return Err(kind_mismatch(we_id, ExerciseKind::Cardio))
            }
            (ExerciseState::Cardio(_), SetPatch::Strength(_)) => {
                return Err(kind_mismatch(we_id, ExerciseKind::Strength))
            }
        };
        if applied {
            Ok(())
        } else {
            Err(SessionError::SetOutOfRange {
                we_id: we_id.to_string(),
                index,
                len,
            })
        }
    }

    /// Moves on from the current set.
    ///
    /// Superset members hand over to the next non-completed member in
    /// rotation; everything else moves its own cursor forward.
    pub fn advance_to_next_set(&mut self, we_id: &str) -> SessionResult<()> {
        let state = self.exercise(we_id)?;
        if !state.current_set_has_data() {
            return Err(ValidationError::EmptySet {
                exercise: self.exercise_name(we_id),
            }
            .into());
        }

        let target = self.next_in_rotation(we_id);
        self.exercise_mut(we_id)?.advance_cursor();

        if let Some(target) = target {
            debug!(from = we_id, to = %target, "superset rotation");
            self.open_only(&target);
        }
        Ok(())
    }

    /// Steps back to the previous set.
    ///
    /// Superset members hand back to the previous non-completed member in
    /// rotation, stepping that member's cursor back; everything else moves
    /// its own cursor back. The cursor never goes below the first set.
    pub fn retreat_to_previous_set(&mut self, we_id: &str) -> SessionResult<()> {
        let state = self.exercise(we_id)?;
        let own_cursor = state.current_set_index();

        let target = self.previous_in_rotation(we_id);
        match target {
            Some(target) => {
                let is_first_member = self
                    .supersets
                    .member(we_id)
                    .is_some_and(|m| m.position == 0);
                if is_first_member && own_cursor == 0 {
                    return Ok(());
                }
                self.exercise_mut(&target)?.retreat_cursor();
                debug!(from = we_id, to = %target, "superset rotation back");
                self.open_only(&target);
            }
            None => self.exercise_mut(we_id)?.retreat_cursor(),
        }
        Ok(())
    }

    /// Marks an exercise completed and opens the next one.
    ///
    /// The next exercise is the first non-completed member of the same
    /// superset group, otherwise the first non-completed exercise later in
    /// the workout. Returns the id of the exercise that was opened.
    /// Completing an exercise twice is rejected and changes nothing.
    pub fn complete_exercise(&mut self, we_id: &str) -> SessionResult<Option<String>> {
        let state = self.exercise(we_id)?;
        if state.is_completed() {
            return Err(SessionError::AlreadyCompleted(we_id.to_string()));
        }
        if !state.has_logged_sets() {
            return Err(ValidationError::NothingLogged {
                exercise: self.exercise_name(we_id),
            }
            .into());
        }

        let bonus = state.as_cardio().map(|c| c.total_time_seconds());
        self.exercise_mut(we_id)?.mark_completed();
        if let Some(seconds) = bonus {
            self.snapshot.add_cardio_bonus(seconds);
        }
        self.snapshot.mark_any_completed();

        let next = self
            .next_in_group(we_id)
            .or_else(|| self.next_in_workout(we_id));
        if let Some(next) = &next {
            self.open_only(next);
        }
        debug!(we_id, next = ?next, "exercise completed");
        Ok(next)
    }

    /// Makes `we_id` the only open exercise.
    pub fn open_exercise(&mut self, we_id: &str) -> SessionResult<()> {
        self.exercise(we_id)?;
        self.open_only(we_id);
        Ok(())
    }

    /// Switches drop-set logging for a strength exercise.
    pub fn set_drop_mode(&mut self, we_id: &str, enabled: bool) -> SessionResult<()> {
        let eligible = self
            .workout()
            .exercise(we_id)
            .map(|we| we.is_dropset_eligible)
            .ok_or_else(|| SessionError::UnknownExercise(we_id.to_string()))?;
        let strength = self.strength_mut(we_id)?;
        if enabled && !eligible {
            return Err(SessionError::DropsetNotEligible(we_id.to_string()));
        }
        strength.set_drop_mode(enabled);
        Ok(())
    }

    /// Appends a drop row to a set, pre-filled from the last row.
    pub fn add_drop(&mut self, we_id: &str, set_index: usize) -> SessionResult<()> {
        let strength = self.drop_mode_state(we_id)?;
        let len = strength.sets().len();
        strength
            .add_drop(set_index)
            .map(|_| ())
            .ok_or_else(|| SessionError::SetOutOfRange {
                we_id: we_id.to_string(),
                index: set_index,
                len,
            })
    }

    /// Merges `patch` into a drop row.
    pub fn update_drop(
        &mut self,
        we_id: &str,
        set_index: usize,
        drop_index: usize,
        patch: DropPatch,
    ) -> SessionResult<()> {
        let strength = self.drop_mode_state(we_id)?;
        if strength.update_drop(set_index, drop_index, patch) {
            Ok(())
        } else {
            Err(SessionError::DropOutOfRange {
                we_id: we_id.to_string(),
                set_index,
                index: drop_index,
            })
        }
    }

    /// Removes a drop row. The last remaining row is never removed; in that
    /// case this returns `Ok(false)`.
    pub fn remove_drop(
        &mut self,
        we_id: &str,
        set_index: usize,
        drop_index: usize,
    ) -> SessionResult<bool> {
        let strength = self.drop_mode_state(we_id)?;
        strength
            .remove_drop(set_index, drop_index)
            .ok_or_else(|| SessionError::DropOutOfRange {
                we_id: we_id.to_string(),
                set_index,
                index: drop_index,
            })
    }

    /// Replaces an exercise's notes.
    pub fn set_exercise_notes(&mut self, we_id: &str, notes: impl Into<String>) -> SessionResult<()> {
        self.exercise_mut(we_id)?.set_notes(notes.into());
        Ok(())
    }

    /// Replaces the workout notes.
    pub fn set_workout_notes(&mut self, notes: impl Into<String>) {
        self.snapshot.set_workout_notes(notes.into());
    }

    /// Adds an exercise to the end of the workout and rebuilds the superset
    /// tables.
    pub fn add_exercise(&mut self, exercise: WorkoutExercise) -> SessionResult<()> {
        if self.snapshot.exercise(&exercise.id).is_some() {
            return Err(SessionError::DuplicateExercise(exercise.id));
        }
        let state = ExerciseState::for_exercise(&exercise);
        self.snapshot
            .exercises_mut()
            .insert(exercise.id.clone(), state);
        self.snapshot.workout_mut().exercises.push(exercise);
        self.supersets = SupersetInfo::from_exercises(&self.snapshot.workout().exercises);
        Ok(())
    }

    /// Ends the session and hands the snapshot to the caller.
    pub fn finish(self) -> SessionSnapshot {
        self.snapshot
    }

    /// Abandons the session. Nothing is saved or queued.
    pub fn discard(self) {
        debug!(workout_id = %self.workout().id, "session discarded");
    }

    fn exercise_mut(&mut self, we_id: &str) -> SessionResult<&mut ExerciseState> {
        self.snapshot
            .exercise_mut(we_id)
            .ok_or_else(|| SessionError::UnknownExercise(we_id.to_string()))
    }

    fn strength_mut(&mut self, we_id: &str) -> SessionResult<&mut StrengthState> {
        self.exercise_mut(we_id)?
            .as_strength_mut()
            .ok_or_else(|| kind_mismatch(we_id, ExerciseKind::Strength))
    }

    fn drop_mode_state(&mut self, we_id: &str) -> SessionResult<&mut StrengthState> {
        let strength = self.strength_mut(we_id)?;
        if !strength.drop_mode() {
            return Err(SessionError::DropModeOff(we_id.to_string()));
        }
        Ok(strength)
    }

    fn exercise_name(&self, we_id: &str) -> String {
        self.workout()
            .exercise(we_id)
            .map(|we| we.exercise.name.clone())
            .unwrap_or_else(|| we_id.to_string())
    }

    fn is_completed(&self, we_id: &str) -> bool {
        self.snapshot
            .exercise(we_id)
            .is_some_and(ExerciseState::is_completed)
    }

    fn next_in_rotation(&self, we_id: &str) -> Option<String> {
        self.supersets
            .rotation_after(we_id)
            .into_iter()
            .find(|id| !self.is_completed(id))
            .map(str::to_string)
    }

    fn previous_in_rotation(&self, we_id: &str) -> Option<String> {
        self.supersets
            .rotation_before(we_id)
            .into_iter()
            .find(|id| !self.is_completed(id))
            .map(str::to_string)
    }

    fn next_in_group(&self, we_id: &str) -> Option<String> {
        let member = self.supersets.member(we_id)?;
        self.supersets
            .group_members(&member.group)
            .iter()
            .find(|id| id.as_str() != we_id && !self.is_completed(id))
            .cloned()
    }

    fn next_in_workout(&self, we_id: &str) -> Option<String> {
        let position = self.workout().position(we_id)?;
        self.workout().exercises[position + 1..]
            .iter()
            .find(|we| we.id != we_id && !self.is_completed(&we.id))
            .map(|we| we.id.clone())
    }

    fn open_only(&mut self, we_id: &str) {
        for (id, state) in self.snapshot.exercises_mut().iter_mut() {
            state.set_open(id == we_id);
        }
    }
}

fn kind_mismatch(we_id: &str, expected: ExerciseKind) -> SessionError {
    SessionError::KindMismatch {
        we_id: we_id.to_string(),
        expected,
    }
}
