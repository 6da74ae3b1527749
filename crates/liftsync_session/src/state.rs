//! Per-exercise logging state and the session snapshot.
//!
//! Set fields hold the user's raw text entry. A blank or whitespace-only
//! field means "nothing logged"; numeric interpretation happens when
//! computing volume and when normalizing for the wire.

use crate::model::{ExerciseKind, Workout, WorkoutExercise};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Parses a decimal entry, accepting `,` as the decimal separator.
pub(crate) fn parse_decimal(value: &str) -> Option<f64> {
    let trimmed = value.trim().replace(',', ".");
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parses a whole-number entry; decimals are rounded.
pub(crate) fn parse_count(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    trimmed
        .parse::<u32>()
        .ok()
        .or_else(|| parse_decimal(trimmed).map(|v| v.round() as u32))
}

fn display_or_dash(value: &str) -> &str {
    if is_blank(value) {
        "-"
    } else {
        value.trim()
    }
}

/// Something that can be logged as one set.
pub(crate) trait LoggedSet: Clone {
    fn has_data(&self) -> bool;
}

/// Moves the cursor forward one set.
///
/// At the end of the list a new set is appended, pre-filled from the current
/// one. Otherwise the existing next set is pre-filled only if it is blank.
fn advance_cursor<S: LoggedSet>(sets: &mut Vec<S>, cursor: &mut usize) {
    let Some(current) = sets.get(*cursor).cloned() else {
        return;
    };
    let next = *cursor + 1;
    match sets.get_mut(next) {
        Some(existing) if !existing.has_data() => *existing = current,
        Some(_) => {}
        None => sets.push(current),
    }
    *cursor = next;
}

fn clamp_cursor<S: LoggedSet + Default>(sets: &mut Vec<S>, cursor: &mut usize) {
    if sets.is_empty() {
        sets.push(S::default());
    }
    if *cursor >= sets.len() {
        *cursor = sets.len() - 1;
    }
}

/// One drop of a drop-set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropRow {
    /// Reps entry.
    pub reps: String,
    /// Weight entry.
    pub weight: String,
}

impl DropRow {
    /// Creates a drop row.
    pub fn new(reps: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            reps: reps.into(),
            weight: weight.into(),
        }
    }

    /// Returns true if either field is filled in.
    pub fn has_data(&self) -> bool {
        !is_blank(&self.reps) || !is_blank(&self.weight)
    }

    /// `reps * weight`, treating missing values as zero.
    pub fn volume(&self) -> f64 {
        let reps = parse_count(&self.reps).unwrap_or(0);
        let weight = parse_decimal(&self.weight).unwrap_or(0.0);
        f64::from(reps) * weight
    }
}

/// A logged strength set.
///
/// When the exercise is in drop mode, `drops` holds at least one row and the
/// set-level fields are unused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthSet {
    /// Reps entry.
    pub reps: String,
    /// Weight entry.
    pub weight: String,
    /// Drop rows, present in drop mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drops: Option<Vec<DropRow>>,
}

impl StrengthSet {
    /// Creates a plain set.
    pub fn new(reps: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            reps: reps.into(),
            weight: weight.into(),
            drops: None,
        }
    }

    /// Creates a drop-set from its rows.
    pub fn with_drops(drops: Vec<DropRow>) -> Self {
        Self {
            reps: String::new(),
            weight: String::new(),
            drops: Some(drops),
        }
    }

    /// Returns true if reps, weight or any drop row is filled in.
    pub fn has_data(&self) -> bool {
        !is_blank(&self.reps) || !is_blank(&self.weight) || self.populated_drops().next().is_some()
    }

    /// Drop rows that have something logged.
    pub fn populated_drops(&self) -> impl Iterator<Item = (usize, &DropRow)> {
        self.drops
            .iter()
            .flatten()
            .enumerate()
            .filter(|(_, row)| row.has_data())
    }

    /// Total volume: the sum over drops, or `reps * weight` for a plain set.
    pub fn volume(&self) -> f64 {
        match &self.drops {
            Some(drops) if drops.iter().any(DropRow::has_data) => {
                drops.iter().map(DropRow::volume).sum()
            }
            _ => DropRow::new(self.reps.as_str(), self.weight.as_str()).volume(),
        }
    }

    fn summary(&self) -> String {
        let rows: Vec<String> = self
            .populated_drops()
            .map(|(_, row)| format!("{} × {}", display_or_dash(&row.reps), display_or_dash(&row.weight)))
            .collect();
        if rows.is_empty() {
            format!("{} × {}", display_or_dash(&self.reps), display_or_dash(&self.weight))
        } else {
            rows.join(" → ")
        }
    }
}

impl LoggedSet for StrengthSet {
    fn has_data(&self) -> bool {
        StrengthSet::has_data(self)
    }
}

/// A logged cardio set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardioSet {
    /// Distance entry.
    pub distance: String,
    /// Duration entry in seconds.
    pub time_seconds: String,
}

impl CardioSet {
    /// Creates a cardio set.
    pub fn new(distance: impl Into<String>, time_seconds: impl Into<String>) -> Self {
        Self {
            distance: distance.into(),
            time_seconds: time_seconds.into(),
        }
    }

    /// Returns true if distance or time is filled in.
    pub fn has_data(&self) -> bool {
        !is_blank(&self.distance) || !is_blank(&self.time_seconds)
    }

    fn summary(&self) -> String {
        format!(
            "{} in {}s",
            display_or_dash(&self.distance),
            display_or_dash(&self.time_seconds)
        )
    }
}

impl LoggedSet for CardioSet {
    fn has_data(&self) -> bool {
        CardioSet::has_data(self)
    }
}

/// Partial update of a strength set. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrengthSetPatch {
    /// New reps entry.
    pub reps: Option<String>,
    /// New weight entry.
    pub weight: Option<String>,
}

impl StrengthSetPatch {
    /// Patch both fields.
    pub fn new(reps: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            reps: Some(reps.into()),
            weight: Some(weight.into()),
        }
    }

    /// Patch reps only.
    pub fn reps(reps: impl Into<String>) -> Self {
        Self {
            reps: Some(reps.into()),
            weight: None,
        }
    }

    /// Patch weight only.
    pub fn weight(weight: impl Into<String>) -> Self {
        Self {
            reps: None,
            weight: Some(weight.into()),
        }
    }
}

/// Partial update of a cardio set. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardioSetPatch {
    /// New distance entry.
    pub distance: Option<String>,
    /// New duration entry.
    pub time_seconds: Option<String>,
}

impl CardioSetPatch {
    /// Patch both fields.
    pub fn new(distance: impl Into<String>, time_seconds: impl Into<String>) -> Self {
        Self {
            distance: Some(distance.into()),
            time_seconds: Some(time_seconds.into()),
        }
    }
}

/// Partial update of a set of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetPatch {
    /// Strength fields.
    Strength(StrengthSetPatch),
    /// Cardio fields.
    Cardio(CardioSetPatch),
}

/// Partial update of a drop row.
pub type DropPatch = StrengthSetPatch;

/// Logging state of a strength exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthState {
    sets: Vec<StrengthSet>,
    current_set_index: usize,
    drop_mode: bool,
    completed: bool,
    notes: String,
    open: bool,
}

impl StrengthState {
    /// Creates `set_count` blank sets (at least one).
    pub fn new(set_count: usize) -> Self {
        Self {
            sets: vec![StrengthSet::default(); set_count.max(1)],
            current_set_index: 0,
            drop_mode: false,
            completed: false,
            notes: String::new(),
            open: false,
        }
    }

    /// The logged sets.
    pub fn sets(&self) -> &[StrengthSet] {
        &self.sets
    }

    /// Returns true if drop mode is on.
    pub fn drop_mode(&self) -> bool {
        self.drop_mode
    }

    /// Total volume over all sets.
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(StrengthSet::volume).sum()
    }

    pub(crate) fn apply_patch(&mut self, index: usize, patch: StrengthSetPatch) -> bool {
        let Some(set) = self.sets.get_mut(index) else {
            return false;
        };
        if let Some(reps) = patch.reps {
            set.reps = reps;
        }
        if let Some(weight) = patch.weight {
            set.weight = weight;
        }
        true
    }

    /// Switches drop mode.
    ///
    /// Enabling moves each set's reps/weight into a single drop row.
    /// Disabling folds the first drop row back into the set.
    pub(crate) fn set_drop_mode(&mut self, enabled: bool) {
        if self.drop_mode == enabled {
            return;
        }
        self.drop_mode = enabled;
        for set in &mut self.sets {
            if enabled {
                let row = DropRow::new(
                    std::mem::take(&mut set.reps),
                    std::mem::take(&mut set.weight),
                );
                set.drops = Some(vec![row]);
            } else if let Some(first) = set.drops.take().and_then(|d| d.into_iter().next()) {
                set.reps = first.reps;
                set.weight = first.weight;
            }
        }
    }

    /// Appends a drop row pre-filled from the last one. Returns the new row
    /// count, or `None` if the set does not exist.
    pub(crate) fn add_drop(&mut self, set_index: usize) -> Option<usize> {
        let set = self.sets.get_mut(set_index)?;
        let drops = set.drops.get_or_insert_with(Vec::new);
        let seed = drops.last().cloned().unwrap_or_default();
        drops.push(seed);
        Some(drops.len())
    }

    pub(crate) fn update_drop(&mut self, set_index: usize, drop_index: usize, patch: DropPatch) -> bool {
        let Some(row) = self
            .sets
            .get_mut(set_index)
            .and_then(|set| set.drops.as_mut())
            .and_then(|drops| drops.get_mut(drop_index))
        else {
            return false;
        };
        if let Some(reps) = patch.reps {
            row.reps = reps;
        }
        if let Some(weight) = patch.weight {
            row.weight = weight;
        }
        true
    }

    /// Removes a drop row, keeping at least one. Returns `None` if the row
    /// does not exist, otherwise whether a row was removed.
    pub(crate) fn remove_drop(&mut self, set_index: usize, drop_index: usize) -> Option<bool> {
        let drops = self.sets.get_mut(set_index)?.drops.as_mut()?;
        if drop_index >= drops.len() {
            return None;
        }
        if drops.len() == 1 {
            return Some(false);
        }
        drops.remove(drop_index);
        Some(true)
    }
}

/// Logging state of a cardio exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardioState {
    sets: Vec<CardioSet>,
    current_set_index: usize,
    completed: bool,
    notes: String,
    open: bool,
}

impl CardioState {
    /// Creates a single blank set.
    pub fn new() -> Self {
        Self {
            sets: vec![CardioSet::default()],
            current_set_index: 0,
            completed: false,
            notes: String::new(),
            open: false,
        }
    }

    /// The logged sets.
    pub fn sets(&self) -> &[CardioSet] {
        &self.sets
    }

    /// Sum of all logged durations in seconds.
    pub fn total_time_seconds(&self) -> u64 {
        self.sets
            .iter()
            .filter_map(|set| parse_count(&set.time_seconds))
            .map(u64::from)
            .sum()
    }

    pub(crate) fn apply_patch(&mut self, index: usize, patch: CardioSetPatch) -> bool {
        let Some(set) = self.sets.get_mut(index) else {
            return false;
        };
        if let Some(distance) = patch.distance {
            set.distance = distance;
        }
        if let Some(time_seconds) = patch.time_seconds {
            set.time_seconds = time_seconds;
        }
        true
    }
}

impl Default for CardioState {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging state of one exercise, keyed by exercise kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExerciseState {
    /// Strength exercise.
    Strength(StrengthState),
    /// Cardio exercise.
    Cardio(CardioState),
}

macro_rules! with_state {
    ($self:expr, $state:ident => $body:expr) => {
        match $self {
            ExerciseState::Strength($state) => $body,
            ExerciseState::Cardio($state) => $body,
        }
    };
}

impl ExerciseState {
    /// Seeds the initial state for a workout exercise.
    pub fn for_exercise(we: &WorkoutExercise) -> Self {
        match we.kind() {
            ExerciseKind::Strength => {
                let sets = we.targets.sets.unwrap_or(1) as usize;
                ExerciseState::Strength(StrengthState::new(sets))
            }
            ExerciseKind::Cardio => ExerciseState::Cardio(CardioState::new()),
        }
    }

    /// The exercise kind.
    pub fn kind(&self) -> ExerciseKind {
        match self {
            ExerciseState::Strength(_) => ExerciseKind::Strength,
            ExerciseState::Cardio(_) => ExerciseKind::Cardio,
        }
    }

    /// Index of the set being logged.
    pub fn current_set_index(&self) -> usize {
        with_state!(self, s => s.current_set_index)
    }

    /// Number of sets.
    pub fn set_count(&self) -> usize {
        with_state!(self, s => s.sets.len())
    }

    /// Returns true once the exercise has been completed.
    pub fn is_completed(&self) -> bool {
        with_state!(self, s => s.completed)
    }

    /// Returns true if this is the active exercise.
    pub fn is_open(&self) -> bool {
        with_state!(self, s => s.open)
    }

    /// Exercise notes.
    pub fn notes(&self) -> &str {
        with_state!(self, s => s.notes.as_str())
    }

    /// Returns true if the set at `index` has anything logged.
    pub fn set_has_data(&self, index: usize) -> bool {
        match self {
            ExerciseState::Strength(s) => s.sets.get(index).is_some_and(|set| set.has_data()),
            ExerciseState::Cardio(s) => s.sets.get(index).is_some_and(|set| set.has_data()),
        }
    }

    /// Returns true if the current set has anything logged.
    pub fn current_set_has_data(&self) -> bool {
        self.set_has_data(self.current_set_index())
    }

    /// Number of sets with anything logged.
    pub fn logged_set_count(&self) -> usize {
        match self {
            ExerciseState::Strength(s) => s.sets.iter().filter(|set| set.has_data()).count(),
            ExerciseState::Cardio(s) => s.sets.iter().filter(|set| set.has_data()).count(),
        }
    }

    /// Returns true if any set has anything logged.
    pub fn has_logged_sets(&self) -> bool {
        self.logged_set_count() > 0
    }

    /// Total strength volume; zero for cardio.
    pub fn volume(&self) -> f64 {
        match self {
            ExerciseState::Strength(s) => s.volume(),
            ExerciseState::Cardio(_) => 0.0,
        }
    }

    /// Short human-readable summary of a set, e.g. `8 × 60`.
    pub fn set_summary(&self, index: usize) -> Option<String> {
        match self {
            ExerciseState::Strength(s) => s.sets.get(index).map(StrengthSet::summary),
            ExerciseState::Cardio(s) => s.sets.get(index).map(CardioSet::summary),
        }
    }

    /// Strength state, if this is a strength exercise.
    pub fn as_strength(&self) -> Option<&StrengthState> {
        match self {
            ExerciseState::Strength(s) => Some(s),
            ExerciseState::Cardio(_) => None,
        }
    }

    /// Cardio state, if this is a cardio exercise.
    pub fn as_cardio(&self) -> Option<&CardioState> {
        match self {
            ExerciseState::Strength(_) => None,
            ExerciseState::Cardio(s) => Some(s),
        }
    }

    pub(crate) fn as_strength_mut(&mut self) -> Option<&mut StrengthState> {
        match self {
            ExerciseState::Strength(s) => Some(s),
            ExerciseState::Cardio(_) => None,
        }
    }

    pub(crate) fn set_open(&mut self, open: bool) {
        with_state!(self, s => s.open = open)
    }

    pub(crate) fn set_notes(&mut self, notes: String) {
        with_state!(self, s => s.notes = notes)
    }

    pub(crate) fn mark_completed(&mut self) {
        with_state!(self, s => {
            s.completed = true;
            s.open = false;
        })
    }

    pub(crate) fn advance_cursor(&mut self) {
        match self {
            ExerciseState::Strength(s) => advance_cursor(&mut s.sets, &mut s.current_set_index),
            ExerciseState::Cardio(s) => advance_cursor(&mut s.sets, &mut s.current_set_index),
        }
    }

    pub(crate) fn retreat_cursor(&mut self) {
        with_state!(self, s => s.current_set_index = s.current_set_index.saturating_sub(1))
    }

    /// Restores the set/cursor invariants on state read back from storage.
    pub(crate) fn repair(&mut self) {
        match self {
            ExerciseState::Strength(s) => clamp_cursor(&mut s.sets, &mut s.current_set_index),
            ExerciseState::Cardio(s) => clamp_cursor(&mut s.sets, &mut s.current_set_index),
        }
    }
}

/// The complete mutable state of one workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    workout: Workout,
    workout_notes: String,
    exercises: BTreeMap<String, ExerciseState>,
    started_at: DateTime<Utc>,
    cardio_time_bonus_seconds: u64,
    any_exercise_completed: bool,
}

impl SessionSnapshot {
    pub(crate) fn initialize(workout: Workout, started_at: DateTime<Utc>) -> Self {
        let exercises = workout
            .exercises
            .iter()
            .map(|we| (we.id.clone(), ExerciseState::for_exercise(we)))
            .collect();
        Self {
            workout,
            workout_notes: String::new(),
            exercises,
            started_at,
            cardio_time_bonus_seconds: 0,
            any_exercise_completed: false,
        }
    }

    /// The workout template.
    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    /// Notes for the whole workout.
    pub fn workout_notes(&self) -> &str {
        &self.workout_notes
    }

    /// Exercise state by workout-exercise id.
    pub fn exercise(&self, we_id: &str) -> Option<&ExerciseState> {
        self.exercises.get(we_id)
    }

    /// Exercise states in workout order.
    pub fn exercises(&self) -> impl Iterator<Item = (&WorkoutExercise, &ExerciseState)> {
        self.workout
            .exercises
            .iter()
            .filter_map(|we| self.exercises.get(&we.id).map(|state| (we, state)))
    }

    /// When the session started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Accumulated seconds of completed cardio exercises.
    pub fn cardio_time_bonus_seconds(&self) -> u64 {
        self.cardio_time_bonus_seconds
    }

    /// Returns true once any exercise has been completed.
    pub fn any_exercise_completed(&self) -> bool {
        self.any_exercise_completed
    }

    /// Seconds from start to `now`, never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }

    /// Reported workout duration: elapsed wall time plus the cardio bonus.
    pub fn duration_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.elapsed_seconds(now)
            .saturating_add(self.cardio_time_bonus_seconds)
    }

    /// Total strength volume of the session.
    pub fn total_volume(&self) -> f64 {
        self.exercises.values().map(ExerciseState::volume).sum()
    }

    /// Number of sets with anything logged, across all exercises.
    pub fn logged_set_count(&self) -> usize {
        self.exercises.values().map(ExerciseState::logged_set_count).sum()
    }

    pub(crate) fn workout_mut(&mut self) -> &mut Workout {
        &mut self.workout
    }

    pub(crate) fn exercises_mut(&mut self) -> &mut BTreeMap<String, ExerciseState> {
        &mut self.exercises
    }

    pub(crate) fn exercise_mut(&mut self, we_id: &str) -> Option<&mut ExerciseState> {
        self.exercises.get_mut(we_id)
    }

    pub(crate) fn set_workout_notes(&mut self, notes: String) {
        self.workout_notes = notes;
    }

    pub(crate) fn add_cardio_bonus(&mut self, seconds: u64) {
        self.cardio_time_bonus_seconds = self.cardio_time_bonus_seconds.saturating_add(seconds);
    }

    pub(crate) fn mark_any_completed(&mut self) {
        self.any_exercise_completed = true;
    }

    /// Restores invariants after deserialization: every template exercise
    /// has a state, and every cursor points at an existing set.
    pub(crate) fn repair(&mut self) {
        for we in &self.workout.exercises {
            self.exercises
                .entry(we.id.clone())
                .or_insert_with(|| ExerciseState::for_exercise(we));
        }
        for state in self.exercises.values_mut() {
            state.repair();
        }
    }
}
