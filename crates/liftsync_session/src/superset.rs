//! Superset grouping.
//!
//! Supersets are derived from the workout template and never stored in
//! session state; rebuild the [`SupersetInfo`] whenever the template
//! changes.

use crate::model::WorkoutExercise;
use std::collections::{HashMap, HashSet};

/// Returns the spreadsheet-column label for a zero-based index:
/// `0 → "A"`, `25 → "Z"`, `26 → "AA"`, `27 → "AB"`.
pub fn column_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        n -= 1;
        label.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// Superset membership of one workout exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupersetMember {
    /// Group id.
    pub group: String,
    /// Rank within the group, ordered by superset index.
    pub position: usize,
}

/// Lookup tables describing the supersets of a workout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupersetInfo {
    by_group: HashMap<String, Vec<String>>,
    by_we_id: HashMap<String, SupersetMember>,
    labels: HashMap<String, String>,
}

impl SupersetInfo {
    /// Builds the tables from exercises in workout order.
    ///
    /// Groups are labelled in order of first appearance. Members are ranked
    /// by `superset_index`; ties keep workout order and a missing index
    /// sorts last. Exercises without a group are left out.
    pub fn from_exercises(exercises: &[WorkoutExercise]) -> Self {
        let mut info = Self::default();
        let mut members: Vec<(String, Vec<(Option<u32>, String)>)> = Vec::new();
        let mut seen = HashSet::new();

        for we in exercises {
            let Some(group) = &we.superset_group else {
                continue;
            };
            if !seen.insert(we.id.as_str()) {
                continue;
            }
            match members.iter_mut().find(|(g, _)| g == group) {
                Some((_, list)) => list.push((we.superset_index, we.id.clone())),
                None => {
                    info.labels
                        .insert(group.clone(), column_label(members.len()));
                    members.push((group.clone(), vec![(we.superset_index, we.id.clone())]));
                }
            }
        }

        for (group, mut list) in members {
            list.sort_by_key(|(index, _)| index.unwrap_or(u32::MAX));
            let ids: Vec<String> = list.into_iter().map(|(_, id)| id).collect();
            for (position, id) in ids.iter().enumerate() {
                info.by_we_id.insert(
                    id.clone(),
                    SupersetMember {
                        group: group.clone(),
                        position,
                    },
                );
            }
            info.by_group.insert(group, ids);
        }

        info
    }

    /// Members of a group in rotation order.
    pub fn group_members(&self, group: &str) -> &[String] {
        self.by_group.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Membership of an exercise, if it belongs to a group.
    pub fn member(&self, we_id: &str) -> Option<&SupersetMember> {
        self.by_we_id.get(we_id)
    }

    /// Label of a group, e.g. `"A"`.
    pub fn label(&self, group: &str) -> Option<&str> {
        self.labels.get(group).map(String::as_str)
    }

    /// Label of the group an exercise belongs to.
    pub fn label_for_exercise(&self, we_id: &str) -> Option<&str> {
        self.member(we_id).and_then(|m| self.label(&m.group))
    }

    /// Size of the group an exercise belongs to; zero if ungrouped.
    pub fn group_size_of(&self, we_id: &str) -> usize {
        self.member(we_id)
            .map(|m| self.group_members(&m.group).len())
            .unwrap_or(0)
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.by_group.len()
    }

    /// The other members of an exercise's group, walking forward in
    /// rotation from the member after it.
    pub fn rotation_after(&self, we_id: &str) -> Vec<&str> {
        self.rotation(we_id, true)
    }

    /// The other members of an exercise's group, walking backward in
    /// rotation from the member before it.
    pub fn rotation_before(&self, we_id: &str) -> Vec<&str> {
        self.rotation(we_id, false)
    }

    fn rotation(&self, we_id: &str, forward: bool) -> Vec<&str> {
        let Some(member) = self.member(we_id) else {
            return Vec::new();
        };
        let ids = self.group_members(&member.group);
        let size = ids.len();
        (1..size)
            .map(|step| {
                if forward {
                    (member.position + step) % size
                } else {
                    (member.position + size - step) % size
                }
            })
            .filter_map(|i| ids.get(i).map(String::as_str))
            .collect()
    }
}
