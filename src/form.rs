//! The entry form: pending exercises accumulated before a save.

use crate::client::ClientError;
use crate::journal::append_exercise;
use crate::models::{Entry, Exercise, WorkoutSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Accumulating,
    Submitting,
}

#[derive(Debug, Clone)]
pub struct JournalForm {
    date: String,
    body_weight: Option<String>,
    goals: Option<String>,
    pending: Vec<Exercise>,
    state: FormState,
}

impl JournalForm {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            body_weight: None,
            goals: None,
            pending: Vec::new(),
            state: FormState::Idle,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn pending(&self) -> &[Exercise] {
        &self.pending
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn set_date(&mut self, date: impl Into<String>) {
        self.date = date.into();
    }

    pub fn set_body_weight(&mut self, weight: Option<String>) {
        self.body_weight = non_blank(weight);
    }

    pub fn set_goals(&mut self, goals: Option<String>) {
        self.goals = non_blank(goals);
    }

    /// Adds a set to the pending list, joining an exercise of the same name.
    pub fn add_set(&mut self, name: &str, set: WorkoutSet) -> Result<(), ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("Exercise name is required.".into()));
        }
        append_exercise(&mut self.pending, Exercise::new(name, vec![set]));
        self.state = FormState::Accumulating;
        Ok(())
    }

    pub fn remove_exercise(&mut self, index: usize) -> Option<Exercise> {
        if index >= self.pending.len() {
            return None;
        }
        let removed = self.pending.remove(index);
        if self.pending.is_empty() {
            self.state = FormState::Idle;
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.state = FormState::Idle;
    }

    /// Validates the form and moves it to `Submitting`, returning the entry
    /// to save. The pending list is kept until [`JournalForm::complete`].
    pub fn begin_submit(&mut self) -> Result<Entry, ClientError> {
        if self.state == FormState::Submitting {
            return Err(ClientError::Validation("A save is already in progress.".into()));
        }
        if self.date.trim().is_empty() {
            return Err(ClientError::Validation("Date is required.".into()));
        }
        if self.pending.is_empty() && self.body_weight.is_none() && self.goals.is_none() {
            return Err(ClientError::Validation("Nothing to save.".into()));
        }

        self.state = FormState::Submitting;
        Ok(Entry {
            date: self.date.trim().to_string(),
            body_weight: self.body_weight.clone(),
            goals: self.goals.clone(),
            exercises: self.pending.clone(),
            ..Entry::default()
        })
    }

    /// The save went through: the pending list is done.
    pub fn complete(&mut self) {
        self.clear();
    }

    /// The save failed: pending exercises stay for a retry.
    pub fn fail(&mut self) {
        self.state = if self.pending.is_empty() {
            FormState::Idle
        } else {
            FormState::Accumulating
        };
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(weight: f64, reps: u32) -> WorkoutSet {
        WorkoutSet::new(Some(weight), Some(reps))
    }

    #[test]
    fn adding_sets_accumulates_by_name() {
        let mut form = JournalForm::new("2024-01-01");
        assert_eq!(form.state(), FormState::Idle);

        form.add_set("Squat", set(95.0, 5)).unwrap();
        form.add_set(" Squat ", set(100.0, 5)).unwrap();
        form.add_set("Bench", set(60.0, 8)).unwrap();

        assert_eq!(form.state(), FormState::Accumulating);
        assert_eq!(form.pending().len(), 2);
        assert_eq!(form.pending()[0].sets, vec![set(95.0, 5), set(100.0, 5)]);
    }

    #[test]
    fn blank_exercise_name_is_rejected() {
        let mut form = JournalForm::new("2024-01-01");
        let err = form.add_set("  ", set(95.0, 5)).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(form.state(), FormState::Idle);
    }

    #[test]
    fn submit_requires_a_date_and_something_to_save() {
        let mut form = JournalForm::new("");
        form.add_set("Squat", set(95.0, 5)).unwrap();
        assert!(matches!(form.begin_submit(), Err(ClientError::Validation(_))));

        let mut empty = JournalForm::new("2024-01-01");
        assert!(matches!(empty.begin_submit(), Err(ClientError::Validation(_))));

        empty.set_body_weight(Some("180".into()));
        let entry = empty.begin_submit().unwrap();
        assert_eq!(entry.body_weight.as_deref(), Some("180"));
        assert!(entry.exercises.is_empty());
    }

    #[test]
    fn success_clears_and_failure_retains() {
        let mut form = JournalForm::new("2024-01-01");
        form.add_set("Squat", set(95.0, 5)).unwrap();

        let entry = form.begin_submit().unwrap();
        assert_eq!(entry.exercises.len(), 1);
        assert_eq!(form.state(), FormState::Submitting);
        assert!(matches!(form.begin_submit(), Err(ClientError::Validation(_))));

        form.fail();
        assert_eq!(form.state(), FormState::Accumulating);
        assert_eq!(form.pending().len(), 1);

        form.begin_submit().unwrap();
        form.complete();
        assert_eq!(form.state(), FormState::Idle);
        assert!(form.pending().is_empty());
    }

    #[test]
    fn removing_last_exercise_returns_to_idle() {
        let mut form = JournalForm::new("2024-01-01");
        form.add_set("Squat", set(95.0, 5)).unwrap();
        assert!(form.remove_exercise(3).is_none());
        assert_eq!(form.remove_exercise(0).unwrap().name, "Squat");
        assert_eq!(form.state(), FormState::Idle);
    }

    #[test]
    fn blank_body_weight_is_ignored() {
        let mut form = JournalForm::new("2024-01-01");
        form.set_body_weight(Some("   ".into()));
        form.add_set("Squat", set(95.0, 5)).unwrap();
        assert_eq!(form.begin_submit().unwrap().body_weight, None);
    }
}
