//! Error types for the session state machine.

use crate::model::ExerciseKind;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// A rejected user action, phrased for display next to the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The current set has nothing logged.
    #[error("Enter reps, weight or distance for {exercise} before moving to the next set.")]
    EmptySet {
        /// Exercise display name.
        exercise: String,
    },

    /// No set of the exercise has anything logged.
    #[error("Log at least one set of {exercise} before completing it.")]
    NothingLogged {
        /// Exercise display name.
        exercise: String,
    },
}

/// Errors returned by session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The action was rejected; show the message inline.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No exercise with this workout-exercise id.
    #[error("unknown workout exercise {0}")]
    UnknownExercise(String),

    /// The set index does not exist.
    #[error("set {index} out of range for {we_id} ({len} sets)")]
    SetOutOfRange {
        /// Workout-exercise id.
        we_id: String,
        /// Requested index.
        index: usize,
        /// Number of sets.
        len: usize,
    },

    /// The drop index does not exist.
    #[error("drop {index} out of range for set {set_index} of {we_id}")]
    DropOutOfRange {
        /// Workout-exercise id.
        we_id: String,
        /// Set index.
        set_index: usize,
        /// Requested drop index.
        index: usize,
    },

    /// The operation needs a different exercise kind.
    #[error("{we_id} is not a {expected} exercise")]
    KindMismatch {
        /// Workout-exercise id.
        we_id: String,
        /// Kind the operation needs.
        expected: ExerciseKind,
    },

    /// Drop-set logging is not allowed for this exercise.
    #[error("drop-sets are not enabled for {0}")]
    DropsetNotEligible(String),

    /// Drop rows were edited while drop mode is off.
    #[error("drop mode is off for {0}")]
    DropModeOff(String),

    /// The exercise was already completed.
    #[error("{0} is already completed")]
    AlreadyCompleted(String),

    /// An exercise with this id is already part of the session.
    #[error("workout exercise {0} already exists")]
    DuplicateExercise(String),
}

impl SessionError {
    /// Returns true if this is a user-facing validation rejection.
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_exercise() {
        let err = SessionError::from(ValidationError::EmptySet {
            exercise: "Bench press".into(),
        });
        assert!(err.is_validation());
        assert!(err.to_string().contains("Bench press"));
    }

    #[test]
    fn structural_errors_are_not_validation() {
        let err = SessionError::KindMismatch {
            we_id: "we1".into(),
            expected: ExerciseKind::Cardio,
        };
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "we1 is not a cardio exercise");
    }
}
