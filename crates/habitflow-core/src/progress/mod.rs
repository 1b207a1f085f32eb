//! Daily tasks, challenges and the streak figures derived from them.

mod streak;
mod tracker;
mod types;

pub use streak::{
    calculate_unified_streak, completed_date_keys, longest_run, week_progress, StreakCalculator,
    MAX_STREAK_WALK_DAYS,
};
pub use tracker::{ProgressTracker, SubscriptionId};
pub use types::{
    Challenge, ChallengeDay, ChallengeSubTask, DailyTask, ProgressMetrics, ProgressSnapshot,
    StreakData, WeekProgress,
};
