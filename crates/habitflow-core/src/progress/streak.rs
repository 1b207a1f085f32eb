//! Unified streak calculation.
//!
//! Completion evidence comes from two places: daily tasks tied to the
//! user's current goal, and checklist items inside active multi-day
//! challenges. Both collapse into one set of local [`DateKey`]s, and every
//! figure here (current streak, best streak, week progress) is derived
//! from that set with plain date arithmetic.
//!
//! ## Grace day
//!
//! A streak is still alive when today has no activity yet but yesterday
//! does. It lapses only once both today and yesterday are empty.

use std::collections::BTreeSet;

use tracing::warn;

use super::types::{Challenge, DailyTask, StreakData, WeekProgress};
use crate::date_key::DateKey;

/// Upper bound on the backward walk for the current streak.
pub const MAX_STREAK_WALK_DAYS: u32 = 365;

/// Build the set of days with qualifying activity.
///
/// A task counts when it is completed and belongs to `current_goal_id`.
/// A challenge day counts when any of its checklist items is completed and
/// the challenge is active. Entries with unreadable dates are logged and
/// skipped.
pub fn completed_date_keys(
    tasks: &[DailyTask],
    current_goal_id: Option<&str>,
    challenges: &[Challenge],
) -> BTreeSet<DateKey> {
    let mut keys = BTreeSet::new();

    if let Some(goal) = current_goal_id {
        for task in tasks.iter().filter(|t| t.completed && t.goal_id == goal) {
            match task.date.local_date_key() {
                Some(key) => {
                    keys.insert(key);
                }
                None => warn!(task_id = %task.id, date = ?task.date, "skipping task with unreadable date"),
            }
        }
    }

    for challenge in challenges.iter().filter(|c| c.active) {
        for day in challenge.days.iter().filter(|d| d.any_completed()) {
            match day.date.local_date_key() {
                Some(key) => {
                    keys.insert(key);
                }
                None => warn!(
                    challenge_id = %challenge.id,
                    date = ?day.date,
                    "skipping challenge day with unreadable date"
                ),
            }
        }
    }

    keys
}

/// Streak calculator over a completed-day set.
#[derive(Debug, Clone)]
pub struct StreakCalculator {
    max_walk_days: u32,
}

impl Default for StreakCalculator {
    fn default() -> Self {
        Self {
            max_walk_days: MAX_STREAK_WALK_DAYS,
        }
    }
}

impl StreakCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_walk(max_walk_days: u32) -> Self {
        Self { max_walk_days }
    }

    /// Derive streak figures from a completed-day set as seen on `today`.
    pub fn calculate(
        &self,
        keys: &BTreeSet<DateKey>,
        previous_best: u32,
        today: DateKey,
    ) -> StreakData {
        if keys.is_empty() {
            return StreakData {
                current_streak: 0,
                best_streak: previous_best,
                last_activity_date: None,
                total_active_days: 0,
            };
        }

        let current = self.current_streak(keys, today);
        let longest = longest_run(keys);

        StreakData {
            current_streak: current,
            best_streak: longest.max(current).max(previous_best),
            last_activity_date: keys.iter().next_back().copied(),
            total_active_days: u32::try_from(keys.len()).unwrap_or(u32::MAX),
        }
    }

    /// Consecutive days ending today, or ending yesterday when today is
    /// still empty.
    pub fn current_streak(&self, keys: &BTreeSet<DateKey>, today: DateKey) -> u32 {
        let yesterday = today.previous();
        let start = if keys.contains(&today) {
            Some(today)
        } else {
            yesterday.filter(|y| keys.contains(y))
        };

        let Some(mut cursor) = start else {
            return 0;
        };

        let mut streak = 0;
        while streak < self.max_walk_days && keys.contains(&cursor) {
            streak += 1;
            match cursor.previous() {
                Some(prev) => cursor = prev,
                None => break,
            }
        }
        streak
    }
}

/// Longest run of consecutive days anywhere in the set.
pub fn longest_run(keys: &BTreeSet<DateKey>) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<DateKey> = None;

    // BTreeSet iterates in chronological order.
    for key in keys {
        run = match prev {
            Some(p) if p.days_until(key) == 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(*key);
    }
    best
}

/// Full calculation from raw inputs.
pub fn calculate_unified_streak(
    tasks: &[DailyTask],
    current_goal_id: Option<&str>,
    challenges: &[Challenge],
    previous_best: u32,
    today: DateKey,
) -> StreakData {
    let keys = completed_date_keys(tasks, current_goal_id, challenges);
    StreakCalculator::default().calculate(&keys, previous_best, today)
}

/// Completion flags for the Monday-starting week that contains `today`.
pub fn week_progress(keys: &BTreeSet<DateKey>, today: DateKey) -> WeekProgress {
    let monday = today.week_start();
    let mut days = [false; 7];
    for (i, slot) in days.iter_mut().enumerate() {
        *slot = monday
            .offset(i as i64)
            .is_some_and(|day| keys.contains(&day));
    }
    WeekProgress(days)
}
