use crate::journal::parse_date;
use crate::models::{Entry, StatsResponse, WeeklyVolumePoint, WeightPoint};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

pub fn build_stats(entries: &[Entry]) -> StatsResponse {
    StatsResponse {
        body_weight: body_weight_series(entries),
        weekly_volume: weekly_volume(entries),
    }
}

/// Body weight over time, for the progress chart.
pub fn body_weight_series(entries: &[Entry]) -> Vec<WeightPoint> {
    let mut points: Vec<(NaiveDate, WeightPoint)> = entries
        .iter()
        .filter_map(|entry| {
            let date = parse_date(&entry.date)?;
            let weight = entry.body_weight.as_deref()?.trim().parse::<f64>().ok()?;
            weight.is_finite().then(|| {
                (
                    date,
                    WeightPoint {
                        date: date_key(date),
                        weight,
                    },
                )
            })
        })
        .collect();
    points.sort_by_key(|(date, _)| *date);
    points.into_iter().map(|(_, point)| point).collect()
}

#[derive(Default)]
struct WeekTotals {
    sessions: u32,
    sets: u32,
    volume: f64,
}

/// Sessions, sets and `weight × reps` volume per ISO week.
pub fn weekly_volume(entries: &[Entry]) -> Vec<WeeklyVolumePoint> {
    let mut weeks: BTreeMap<NaiveDate, WeekTotals> = BTreeMap::new();
    for entry in entries {
        let Some(date) = parse_date(&entry.date) else {
            continue;
        };
        let totals = weeks.entry(week_start(date)).or_default();
        totals.sessions = totals.sessions.saturating_add(1);
        for set in entry.exercises.iter().flat_map(|exercise| &exercise.sets) {
            totals.sets = totals.sets.saturating_add(1);
            if let (Some(weight), Some(reps)) = (set.weight, set.reps) {
                totals.volume += weight * f64::from(reps);
            }
        }
    }

    weeks
        .into_iter()
        .map(|(start, totals)| WeeklyVolumePoint {
            week: week_label(start),
            start_date: date_key(start),
            sessions: totals.sessions,
            sets: totals.sets,
            volume: totals.volume,
        })
        .collect()
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
