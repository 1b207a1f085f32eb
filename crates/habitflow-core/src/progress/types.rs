use serde::{Deserialize, Serialize};

use crate::date_key::{DateInput, DateKey};
use crate::error::ValidationError;

/// A task scheduled for a single day under a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: String,
    pub title: String,
    pub date: DateInput,
    pub goal_id: String,
    #[serde(default)]
    pub completed: bool,
}

impl DailyTask {
    pub fn new(title: impl Into<String>, date: impl Into<DateInput>, goal_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            date: date.into(),
            goal_id: goal_id.into(),
            completed: false,
        }
    }

    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }
}

/// One item on a challenge day's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeSubTask {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// A single calendar day inside a multi-day challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeDay {
    pub date: DateInput,
    #[serde(default)]
    pub tasks: Vec<ChallengeSubTask>,
}

impl ChallengeDay {
    pub fn any_completed(&self) -> bool {
        self.tasks.iter().any(|t| t.completed)
    }
}

/// A multi-day challenge with a checklist per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub days: Vec<ChallengeDay>,
}

fn default_true() -> bool {
    true
}

impl Challenge {
    /// Build a challenge of `length` consecutive days starting at `start`,
    /// each day carrying the same checklist.
    ///
    /// Fails with [`ValidationError::EmptyCollection`] when there are no
    /// days or no checklist items.
    pub fn consecutive(
        title: impl Into<String>,
        start: DateKey,
        length: u32,
        checklist: &[String],
    ) -> Result<Self, ValidationError> {
        if checklist.is_empty() {
            return Err(ValidationError::EmptyCollection("challenge checklist".into()));
        }
        let days: Vec<ChallengeDay> = (0..i64::from(length))
            .filter_map(|offset| start.offset(offset))
            .map(|day| ChallengeDay {
                date: day.into(),
                tasks: checklist
                    .iter()
                    .map(|title| ChallengeSubTask {
                        title: title.clone(),
                        completed: false,
                    })
                    .collect(),
            })
            .collect();
        if days.is_empty() {
            return Err(ValidationError::EmptyCollection("challenge days".into()));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            active: true,
            days,
        })
    }

    /// The challenge day that falls on `key`, if any.
    pub fn day_mut(&mut self, key: DateKey) -> Option<&mut ChallengeDay> {
        self.days
            .iter_mut()
            .find(|d| d.date.local_date_key() == Some(key))
    }

    pub fn completed_subtasks(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| d.tasks.iter())
            .filter(|t| t.completed)
            .count()
    }
}

/// Aggregate streak state.
///
/// `best_streak` is never below `current_streak` nor below any best value
/// previously handed to the calculator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakData {
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_activity_date: Option<DateKey>,
    pub total_active_days: u32,
}

/// Completion flags for Monday..Sunday of the current week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekProgress(pub [bool; 7]);

impl WeekProgress {
    pub fn days(&self) -> &[bool; 7] {
        &self.0
    }

    pub fn completed_count(&self) -> usize {
        self.0.iter().filter(|d| **d).count()
    }
}

/// Progress figures consumed by the reward gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMetrics {
    pub current_streak: u32,
    pub total_completed_tasks: u32,
    pub focus_time_minutes: u32,
    pub today_completed_tasks: u32,
    pub today_total_tasks: u32,
    pub is_ready: bool,
}

impl ProgressMetrics {
    /// Every task tracked for today is done, and there is at least one.
    pub fn day_complete(&self) -> bool {
        self.today_total_tasks > 0 && self.today_completed_tasks >= self.today_total_tasks
    }
}

/// Everything subscribers receive after a progress change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub today: DateKey,
    pub streak: StreakData,
    pub week: WeekProgress,
    pub metrics: ProgressMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_challenge_spans_days_with_checklist() {
        let start = DateKey::from_ymd(2024, 2, 28).unwrap();
        let challenge =
            Challenge::consecutive("water", start, 3, &["drink".into(), "log".into()]).unwrap();
        assert!(challenge.active);
        assert_eq!(challenge.days.len(), 3);
        assert_eq!(
            challenge.days[2].date.local_date_key(),
            DateKey::from_ymd(2024, 3, 1)
        );
        assert!(challenge.days.iter().all(|d| d.tasks.len() == 2));
    }

    #[test]
    fn empty_challenges_are_refused() {
        let start = DateKey::from_ymd(2024, 5, 10).unwrap();
        assert!(matches!(
            Challenge::consecutive("water", start, 3, &[]),
            Err(ValidationError::EmptyCollection(what)) if what == "challenge checklist"
        ));
        assert!(matches!(
            Challenge::consecutive("water", start, 0, &["drink".into()]),
            Err(ValidationError::EmptyCollection(what)) if what == "challenge days"
        ));
    }
}
