//! Text rendering of exercises for the journal and the pending-exercise list.

use crate::journal::group_sets;
use crate::models::{Exercise, GroupedSet};

/// `100lb × 5 @ 0:45 x 3`; missing or zero weight and reps render empty, the
/// count only when above one.
pub fn format_set(set: &GroupedSet) -> String {
    let weight = set
        .weight
        .filter(|w| *w != 0.0)
        .map(|w| w.to_string())
        .unwrap_or_default();
    let reps = set
        .reps
        .filter(|r| *r != 0)
        .map(|r| r.to_string())
        .unwrap_or_default();
    let mut text = format!("{weight}lb × {reps}");
    if let Some(time) = set.time.as_deref().filter(|time| !time.is_empty()) {
        text.push_str(&format!(" @ {time}"));
    }
    if set.count > 1 {
        text.push_str(&format!(" x {}", set.count));
    }
    text
}

pub fn format_exercise(exercise: &Exercise) -> String {
    let sets: Vec<String> = group_sets(&exercise.sets).iter().map(format_set).collect();
    format!("{}: {}", exercise.name, sets.join(", "))
}
