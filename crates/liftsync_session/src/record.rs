//! The canonical save record sent to the backend.
//!
//! Field names follow the backend's wire contract: camelCase for the record
//! and its history entries, snake_case for target updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A finished workout ready to be saved. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    /// Key the backend deduplicates on.
    pub idempotency_key: String,
    /// Template the session was started from.
    pub workout_id: String,
    /// Completion time.
    #[serde(with = "iso_millis")]
    pub completed_at: DateTime<Utc>,
    /// Reported duration, usually [`SessionSnapshot::duration_seconds`].
    ///
    /// [`SessionSnapshot::duration_seconds`]: crate::SessionSnapshot::duration_seconds
    pub duration_seconds: u64,
    /// Workout-level notes.
    pub notes: String,
    /// Plan this workout belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_workout_id: Option<String>,
    /// One entry per exercise with logged data, in workout order.
    pub exercise_history: Vec<ExerciseHistoryEntry>,
    /// Suggested targets for template-bound exercises.
    pub workout_exercise_target_updates: Vec<TargetUpdate>,
}

impl SaveRecord {
    /// Number of exercises in the record.
    pub fn exercise_count(&self) -> usize {
        self.exercise_history.len()
    }

    /// Number of wire sets across all exercises.
    pub fn set_count(&self) -> usize {
        self.exercise_history.iter().map(|e| e.sets.len()).sum()
    }

    /// Size of the serialized record in bytes, or 0 if it cannot be encoded.
    pub fn approximate_size(&self) -> usize {
        serde_json::to_vec(self).map(|b| b.len()).unwrap_or(0)
    }
}

/// Logged sets for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseHistoryEntry {
    /// Library exercise id.
    pub exercise_id: String,
    /// Position in the workout.
    pub order_index: u32,
    /// Exercise notes.
    pub notes: String,
    /// Template row id; absent for ad-hoc exercises.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_exercise_id: Option<String>,
    /// Whether the sets were logged in drop mode.
    pub is_dropset: bool,
    /// Superset group, if any.
    pub superset_group: Option<String>,
    /// Position within the superset group.
    pub superset_index: Option<u32>,
    /// Logged sets.
    pub sets: Vec<WireSet>,
}

/// One logged set (or one drop of a drop-set).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSet {
    /// 1-based, contiguous across logged sets.
    pub set_number: u32,
    /// Index of the drop within its set; 0 for plain sets.
    pub drop_index: u32,
    /// Repetitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    /// Weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_seconds: Option<u32>,
    /// Distance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Set notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// New target hints for a template exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetUpdate {
    /// Template row id.
    pub id: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sets: Option<u32>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_reps: Option<u32>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_time_seconds: Option<u32>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_distance: Option<f64>,
}

/// `2024-05-01T10:00:00.000Z`
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> SaveRecord {
        SaveRecord {
            idempotency_key: "k1".into(),
            workout_id: "w1".into(),
            completed_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            duration_seconds: 3600,
            notes: String::new(),
            plan_workout_id: None,
            exercise_history: vec![ExerciseHistoryEntry {
                exercise_id: "bench".into(),
                order_index: 0,
                notes: String::new(),
                workout_exercise_id: Some("we1".into()),
                is_dropset: false,
                superset_group: None,
                superset_index: None,
                sets: vec![
                    WireSet {
                        set_number: 1,
                        reps: Some(8),
                        weight: Some(60.0),
                        ..WireSet::default()
                    },
                    WireSet {
                        set_number: 2,
                        reps: Some(6),
                        ..WireSet::default()
                    },
                ],
            }],
            workout_exercise_target_updates: vec![TargetUpdate {
                id: "we1".into(),
                target_reps: Some(6),
                ..TargetUpdate::default()
            }],
        }
    }

    #[test]
    fn wire_field_names() {
        let json = serde_json::to_value(record()).unwrap();

        assert_eq!(json["idempotencyKey"], "k1");
        assert_eq!(json["completedAt"], "2024-05-01T10:00:00.000Z");
        assert!(json.get("planWorkoutId").is_none());

        let entry = &json["exerciseHistory"][0];
        assert_eq!(entry["workoutExerciseId"], "we1");
        assert_eq!(entry["isDropset"], false);
        assert!(entry["supersetGroup"].is_null());
        assert_eq!(entry["sets"][1]["setNumber"], 2);
        assert!(entry["sets"][1].get("weight").is_none());

        let update = &json["workoutExerciseTargetUpdates"][0];
        assert_eq!(update["target_reps"], 6);
        assert!(update.get("target_weight").is_none());
    }

    #[test]
    fn reads_back_offset_timestamps() {
        let mut json = serde_json::to_value(record()).unwrap();
        json["completedAt"] = "2024-05-01T12:00:00.000+02:00".into();
        let parsed: SaveRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.completed_at, record().completed_at);
    }

    #[test]
    fn counts() {
        let record = record();
        assert_eq!(record.exercise_count(), 1);
        assert_eq!(record.set_count(), 2);
        assert!(record.approximate_size() > 100);
    }
}
