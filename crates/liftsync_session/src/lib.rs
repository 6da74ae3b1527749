//! # LiftSync Session
//!
//! In-progress workout state for LiftSync.
//!
//! This crate provides:
//! - The workout template model (exercises, targets, superset membership)
//! - Superset grouping with stable alphabetic labels
//! - The per-exercise logging state machine (sets, drop-sets, cursors)
//! - The payload normalizer that turns a finished session into a
//!   canonical save record
//! - A live-status ticker for lock-screen style progress displays
//!
//! ## Lifecycle
//!
//! ```text
//! Workout ──start──▶ Session ──(update/advance/retreat/complete)──▶ Session
//!                       │
//!                       └──finish──▶ SessionSnapshot ──normalize──▶ SaveRecord
//! ```
//!
//! The state machine never performs I/O and never suspends mid-mutation.
//! Finishing a session moves the snapshot out of the machine; there is no
//! shared "current session".
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use liftsync_session::{
//!     Exercise, ExerciseKind, Session, SetPatch, StrengthSetPatch, Workout, WorkoutExercise,
//! };
//!
//! let workout = Workout::new("w1", "Push day").with_exercise(WorkoutExercise::new(
//!     "we1",
//!     Exercise::new("bench", "Bench press", ExerciseKind::Strength),
//! ));
//!
//! let mut session = Session::start(workout, Utc::now());
//! session
//!     .update_set("we1", 0, SetPatch::Strength(StrengthSetPatch::new("8", "60")))
//!     .unwrap();
//! session.advance_to_next_set("we1").unwrap();
//! assert_eq!(session.exercise("we1").unwrap().current_set_index(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod live_status;
mod machine;
mod model;
mod normalize;
mod record;
mod state;
mod superset;

pub use error::{SessionError, SessionResult, ValidationError};
pub use live_status::{LiveStatus, LiveStatusSink, LiveStatusTicker, LiveStatusUpdate, TickerConfig};
pub use machine::Session;
pub use model::{Exercise, ExerciseKind, ExerciseOrigin, TargetHints, Workout, WorkoutExercise};
pub use normalize::normalize;
pub use record::{ExerciseHistoryEntry, SaveRecord, TargetUpdate, WireSet};
pub use state::{
    CardioSet, CardioSetPatch, CardioState, DropPatch, DropRow, ExerciseState, SessionSnapshot,
    SetPatch, StrengthSet, StrengthSetPatch, StrengthState,
};
pub use superset::{column_label, SupersetInfo, SupersetMember};
