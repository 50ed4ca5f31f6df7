//! Entry reconciliation and set grouping.

use crate::models::{Entry, Exercise, GroupedSet, WorkoutSet};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Run-length encodes consecutive identical sets.
///
/// Only neighbours collapse: `[a, a, b, a]` yields three groups.
pub fn group_sets(sets: &[WorkoutSet]) -> Vec<GroupedSet> {
    let mut grouped: Vec<GroupedSet> = Vec::new();
    for set in sets {
        match grouped.last_mut() {
            Some(last) if same_set(last, set) => last.count += 1,
            _ => grouped.push(GroupedSet {
                weight: set.weight,
                reps: set.reps,
                time: set.time.clone(),
                count: 1,
            }),
        }
    }
    grouped
}

/// Inverse of [`group_sets`].
pub fn expand_groups(groups: &[GroupedSet]) -> Vec<WorkoutSet> {
    groups
        .iter()
        .flat_map(|group| {
            let set = WorkoutSet {
                weight: group.weight,
                reps: group.reps,
                time: group.time.clone(),
            };
            std::iter::repeat_n(set, group.count as usize)
        })
        .collect()
}

fn same_set(group: &GroupedSet, set: &WorkoutSet) -> bool {
    group.weight == set.weight && group.reps == set.reps && group.time == set.time
}

/// Reconciles two entry collections into one list keyed by date.
///
/// Entries carrying the same non-zero `id` and date are one record and the
/// remote copy replaces the local one; entries without an id are one record
/// only when they are identical. The remaining entries of a date are
/// folded oldest to newest by `id` (remote after local on ties): scalar fields
/// take the newest non-empty value and exercise lists are concatenated as-is.
/// The result is ascending by calendar date.
pub fn merge_entries(local: &[Entry], remote: &[Entry]) -> Vec<Entry> {
    let mut records: Vec<Entry> = Vec::with_capacity(local.len() + remote.len());
    for entry in local.iter().chain(remote) {
        let existing = records.iter().position(|record| {
            if entry.id == 0 {
                record == entry
            } else {
                record.id == entry.id && record.date == entry.date
            }
        });
        match existing {
            Some(index) => records[index] = entry.clone(),
            None => records.push(entry.clone()),
        }
    }

    // stable: equal ids keep local-then-remote order
    records.sort_by_key(|entry| entry.id);

    let mut merged: Vec<Entry> = Vec::with_capacity(records.len());
    let mut by_date: HashMap<String, usize> = HashMap::new();
    for entry in records {
        match by_date.get(&entry.date) {
            Some(&index) => fold_newer(&mut merged[index], entry),
            None => {
                by_date.insert(entry.date.clone(), merged.len());
                merged.push(entry);
            }
        }
    }

    sort_by_date(&mut merged);
    merged
}

fn fold_newer(older: &mut Entry, newer: Entry) {
    older.id = newer.id;
    if newer.body_weight.is_some() {
        older.body_weight = newer.body_weight;
    }
    if newer.goals.is_some() {
        older.goals = newer.goals;
    }
    if !newer.user_email.is_empty() {
        older.user_email = newer.user_email;
    }
    older.exercises.extend(newer.exercises);
}

/// Folds a new save into the stored entry for the same date.
///
/// Sets of an exercise that already exists by name are appended to it; other
/// exercises are appended in order. Body weight and goals only overwrite when
/// the incoming value is present.
pub fn consolidate(existing: &mut Entry, incoming: Entry) {
    if incoming.body_weight.is_some() {
        existing.body_weight = incoming.body_weight;
    }
    if incoming.goals.is_some() {
        existing.goals = incoming.goals;
    }
    for exercise in incoming.exercises {
        append_exercise(&mut existing.exercises, exercise);
    }
}

/// Appends `exercise` to `exercises`, joining an existing exercise of the
/// same name.
pub fn append_exercise(exercises: &mut Vec<Exercise>, exercise: Exercise) {
    match exercises
        .iter_mut()
        .find(|current| current.name == exercise.name)
    {
        Some(current) => current.sets.extend(exercise.sets),
        None => exercises.push(exercise),
    }
}

/// Sorts ascending by calendar date. Dates that do not parse go last, in
/// string order.
pub fn sort_by_date(entries: &mut [Entry]) {
    entries.sort_by_cached_key(|entry| {
        let parsed = parse_date(&entry.date);
        (parsed.is_none(), parsed, entry.date.clone())
    });
}

/// Parses the `YYYY-MM-DD` prefix of an entry date.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    let day = date.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
