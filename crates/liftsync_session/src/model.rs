//! Workout template model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an exercise, which decides the shape of its logged sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    /// Reps and weight, optionally with drop rows.
    Strength,
    /// Distance and time.
    Cardio,
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseKind::Strength => write!(f, "strength"),
            ExerciseKind::Cardio => write!(f, "cardio"),
        }
    }
}

/// A catalog exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Catalog id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Strength or cardio.
    pub kind: ExerciseKind,
}

impl Exercise {
    /// Creates a catalog exercise.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ExerciseKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }
}

/// Target hints shown to the user while logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetHints {
    /// Planned number of sets.
    pub sets: Option<u32>,
    /// Planned reps per set.
    pub reps: Option<u32>,
    /// Planned weight.
    pub weight: Option<f64>,
    /// Planned duration in seconds (cardio).
    pub time_seconds: Option<u32>,
    /// Planned distance (cardio).
    pub distance: Option<f64>,
}

impl TargetHints {
    /// Strength targets.
    pub fn strength(sets: u32, reps: u32, weight: Option<f64>) -> Self {
        Self {
            sets: Some(sets),
            reps: Some(reps),
            weight,
            ..Self::default()
        }
    }

    /// Cardio targets.
    pub fn cardio(time_seconds: Option<u32>, distance: Option<f64>) -> Self {
        Self {
            time_seconds,
            distance,
            ..Self::default()
        }
    }
}

/// Where a workout exercise came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseOrigin {
    /// Bound to a row of the saved workout template.
    #[default]
    Template,
    /// Added during the session; has no template row to update.
    AdHoc,
}

/// One exercise slot of a workout template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    /// Workout-exercise id (unique within the workout).
    pub id: String,
    /// The catalog exercise.
    pub exercise: Exercise,
    /// Target hints.
    #[serde(default)]
    pub targets: TargetHints,
    /// Opaque superset group id.
    #[serde(default)]
    pub superset_group: Option<String>,
    /// Position within the superset group.
    #[serde(default)]
    pub superset_index: Option<u32>,
    /// Whether drop-set logging may be switched on.
    #[serde(default)]
    pub is_dropset_eligible: bool,
    /// Template-bound or ad-hoc.
    #[serde(default)]
    pub origin: ExerciseOrigin,
}

impl WorkoutExercise {
    /// Creates a template-bound workout exercise without targets.
    pub fn new(id: impl Into<String>, exercise: Exercise) -> Self {
        Self {
            id: id.into(),
            exercise,
            targets: TargetHints::default(),
            superset_group: None,
            superset_index: None,
            is_dropset_eligible: false,
            origin: ExerciseOrigin::Template,
        }
    }

    /// Sets the target hints.
    #[must_use]
    pub fn with_targets(mut self, targets: TargetHints) -> Self {
        self.targets = targets;
        self
    }

    /// Places the exercise in a superset group.
    #[must_use]
    pub fn in_superset(mut self, group: impl Into<String>, index: u32) -> Self {
        self.superset_group = Some(group.into());
        self.superset_index = Some(index);
        self
    }

    /// Allows drop-set logging.
    #[must_use]
    pub fn dropset_eligible(mut self) -> Self {
        self.is_dropset_eligible = true;
        self
    }

    /// Marks the exercise as added during the session.
    #[must_use]
    pub fn ad_hoc(mut self) -> Self {
        self.origin = ExerciseOrigin::AdHoc;
        self
    }

    /// Returns true if the exercise has a template row to update.
    pub fn is_template_bound(&self) -> bool {
        self.origin == ExerciseOrigin::Template
    }

    /// The exercise kind.
    pub fn kind(&self) -> ExerciseKind {
        self.exercise.kind
    }
}

/// An immutable workout template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// Workout id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Exercises in workout order.
    pub exercises: Vec<WorkoutExercise>,
}

impl Workout {
    /// Creates an empty workout.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            exercises: Vec::new(),
        }
    }

    /// Appends an exercise.
    #[must_use]
    pub fn with_exercise(mut self, exercise: WorkoutExercise) -> Self {
        self.exercises.push(exercise);
        self
    }

    /// Looks up an exercise by workout-exercise id.
    pub fn exercise(&self, we_id: &str) -> Option<&WorkoutExercise> {
        self.exercises.iter().find(|we| we.id == we_id)
    }

    /// Returns the position of an exercise in workout order.
    pub fn position(&self, we_id: &str) -> Option<usize> {
        self.exercises.iter().position(|we| we.id == we_id)
    }
}
