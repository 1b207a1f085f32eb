use serde::{Deserialize, Serialize};

use crate::progress::ProgressMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardCategory {
    /// Measured against the current streak in days.
    Streak,
    /// Measured against all completed tasks.
    Tasks,
    /// Measured against total focus minutes.
    Focus,
}

impl RewardCategory {
    pub fn metric(self, metrics: &ProgressMetrics) -> u32 {
        match self {
            RewardCategory::Streak => metrics.current_streak,
            RewardCategory::Tasks => metrics.total_completed_tasks,
            RewardCategory::Focus => metrics.focus_time_minutes,
        }
    }
}

/// A cosmetic unlock. The catalog is static; whether a reward has been
/// granted lives in the gate's seen set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: RewardCategory,
    pub requirement: u32,
}

impl Reward {
    pub fn new(id: &str, title: &str, category: RewardCategory, requirement: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category,
            requirement,
        }
    }

    pub fn qualifies(&self, metrics: &ProgressMetrics) -> bool {
        self.category.metric(metrics) >= self.requirement
    }
}

/// Catalog entry joined with the user's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardStatus {
    pub reward: Reward,
    pub unlocked: bool,
    /// Meets its requirement under the current metrics.
    pub qualifies: bool,
}

/// The unlock sequence. Rewards are granted strictly in this order.
pub fn default_catalog() -> Vec<Reward> {
    use RewardCategory::*;
    let describe = |mut r: Reward, text: &str| {
        r.description = text.into();
        r
    };
    vec![
        describe(Reward::new("first-step", "Sprout Theme", Tasks, 1), "Complete your first task."),
        describe(Reward::new("three-day-streak", "Morning Glow", Streak, 3), "Keep a 3 day streak."),
        describe(Reward::new("focused-ten", "Calm Waves Sound", Focus, 10), "Spend 10 minutes in focus."),
        describe(Reward::new("ten-tasks", "Meadow Badge", Tasks, 10), "Complete 10 tasks."),
        describe(Reward::new("week-streak", "Sunrise Theme", Streak, 7), "Keep a 7 day streak."),
        describe(Reward::new("focused-hour", "Rainfall Sound", Focus, 60), "Spend an hour in focus."),
        describe(Reward::new("fifty-tasks", "Evergreen Badge", Tasks, 50), "Complete 50 tasks."),
        describe(Reward::new("fortnight-streak", "Aurora Theme", Streak, 14), "Keep a 14 day streak."),
        describe(Reward::new("deep-focus", "Forest Night Sound", Focus, 300), "Spend 5 hours in focus."),
        describe(Reward::new("month-streak", "Golden Hour Theme", Streak, 30), "Keep a 30 day streak."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let catalog = default_catalog();
        let mut ids: Vec<_> = catalog.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn qualification_reads_the_category_metric() {
        let metrics = ProgressMetrics {
            current_streak: 3,
            total_completed_tasks: 9,
            focus_time_minutes: 60,
            ..Default::default()
        };
        assert!(Reward::new("a", "A", RewardCategory::Streak, 3).qualifies(&metrics));
        assert!(!Reward::new("b", "B", RewardCategory::Tasks, 10).qualifies(&metrics));
        assert!(Reward::new("c", "C", RewardCategory::Focus, 60).qualifies(&metrics));
    }
}
