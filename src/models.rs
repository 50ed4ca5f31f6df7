use serde::{Deserialize, Deserializer, Serialize};

/// One performed unit of an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkoutSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,
}

impl WorkoutSet {
    pub fn new(weight: Option<f64>, reps: Option<u32>) -> Self {
        Self {
            weight,
            reps,
            time: None,
        }
    }

    pub fn timed(time: impl Into<String>) -> Self {
        Self {
            weight: None,
            reps: None,
            time: Some(time.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

impl Exercise {
    pub fn new(name: impl Into<String>, sets: Vec<WorkoutSet>) -> Self {
        Self {
            name: name.into(),
            sets,
        }
    }
}

/// One calendar day's journal record for a user.
///
/// `id` is the creation time in epoch milliseconds; `0` means the server has
/// not assigned one yet. `date` is the merge key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(default)]
    pub date: String,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub body_weight: Option<String>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub goals: Option<String>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub user_email: String,
}

impl Entry {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }
}

/// A run of consecutive identical sets, as shown in the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedSet {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub time: Option<String>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: Profile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkRequest {
    pub entries: Vec<Entry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            count: None,
        }
    }

    pub fn with_count(message: impl Into<String>, count: usize) -> Self {
        Self {
            message: message.into(),
            count: Some(count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightPoint {
    pub date: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyVolumePoint {
    pub week: String,
    pub start_date: String,
    pub sessions: u32,
    pub sets: u32,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub body_weight: Vec<WeightPoint>,
    pub weekly_volume: Vec<WeeklyVolumePoint>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(f64),
}

/// Collapses missing, `null`, and blank strings into `None`. Numbers are
/// accepted and kept as their decimal text.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Text(text)) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Loose::Number(number)) => Some(number.to_string()),
        None => None,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(|id| id.trunc() as i64).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optionals_collapse_to_none() {
        let entry: Entry = serde_json::from_str(
            r#"{"date":"2024-01-01","bodyWeight":"  ","goals":null,"exercises":[]}"#,
        )
        .unwrap();
        assert_eq!(entry.body_weight, None);
        assert_eq!(entry.goals, None);
        assert_eq!(entry.id, 0);
        assert!(entry.user_email.is_empty());
    }

    #[test]
    fn numeric_body_weight_is_kept_as_text() {
        let entry: Entry =
            serde_json::from_str(r#"{"date":"2024-01-01","bodyWeight":180.5}"#).unwrap();
        assert_eq!(entry.body_weight.as_deref(), Some("180.5"));
    }

    #[test]
    fn fractional_ids_are_truncated() {
        let entry: Entry =
            serde_json::from_str(r#"{"id":1704067200000.42,"date":"2024-01-01"}"#).unwrap();
        assert_eq!(entry.id, 1_704_067_200_000);
    }

    #[test]
    fn entry_serializes_in_camel_case_without_empty_optionals() {
        let mut entry = Entry::new("2024-01-01");
        entry.id = 7;
        entry.body_weight = Some("180".into());
        entry.user_email = "a@example.com".into();
        entry.exercises.push(Exercise::new(
            "Squat",
            vec![WorkoutSet::new(Some(100.0), Some(5))],
        ));

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["bodyWeight"], "180");
        assert_eq!(value["userEmail"], "a@example.com");
        assert!(value.get("goals").is_none());
        assert!(value["exercises"][0]["sets"][0].get("time").is_none());
    }
}
