//! Progress state holder.
//!
//! [`ProgressTracker`] owns the task list, challenges, the current goal and
//! focus minutes. Every mutation recomputes a [`ProgressSnapshot`] and hands
//! it to each subscriber, so listeners (the reward gate, a UI, the CLI)
//! never hold a stale copy of the figures.

use std::collections::BTreeSet;

use tracing::debug;

use super::streak::{completed_date_keys, week_progress, StreakCalculator};
use super::types::{Challenge, DailyTask, ProgressMetrics, ProgressSnapshot, StreakData};
use crate::date_key::DateKey;
use crate::error::{Result, ValidationError};
use crate::storage::{keys, load_json, save_json_best_effort, KeyValueStore};

type Listener = Box<dyn Fn(&ProgressSnapshot)>;

/// Handle returned by [`ProgressTracker::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

pub struct ProgressTracker {
    today: DateKey,
    tasks: Vec<DailyTask>,
    challenges: Vec<Challenge>,
    current_goal: Option<String>,
    focus_minutes: u32,
    stored_best: u32,
    ready: bool,
    calculator: StreakCalculator,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_listener: u64,
}

impl ProgressTracker {
    /// An empty tracker. It reports `is_ready = false` until
    /// [`mark_ready`](Self::mark_ready) or [`load`](Self::load).
    pub fn new(today: DateKey) -> Self {
        Self {
            today,
            tasks: Vec::new(),
            challenges: Vec::new(),
            current_goal: None,
            focus_minutes: 0,
            stored_best: 0,
            ready: false,
            calculator: StreakCalculator::default(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Restore persisted progress. Unreadable entries fall back to empty.
    pub fn load(store: &dyn KeyValueStore, today: DateKey) -> Self {
        let mut tracker = Self::new(today);
        tracker.tasks = load_json(store, keys::TASKS).unwrap_or_default();
        tracker.challenges = load_json(store, keys::CHALLENGES).unwrap_or_default();
        tracker.current_goal = load_json(store, keys::CURRENT_GOAL).unwrap_or_default();
        tracker.focus_minutes = load_json(store, keys::FOCUS_MINUTES).unwrap_or_default();
        tracker.stored_best = load_json(store, keys::BEST_STREAK).unwrap_or_default();
        tracker.raise_stored_best();
        tracker.ready = true;
        debug!(
            tasks = tracker.tasks.len(),
            challenges = tracker.challenges.len(),
            "progress loaded"
        );
        tracker
    }

    /// Persist everything. Failures are logged and ignored.
    pub fn save(&self, store: &dyn KeyValueStore) {
        save_json_best_effort(store, keys::TASKS, &self.tasks);
        save_json_best_effort(store, keys::CHALLENGES, &self.challenges);
        save_json_best_effort(store, keys::CURRENT_GOAL, &self.current_goal);
        save_json_best_effort(store, keys::FOCUS_MINUTES, &self.focus_minutes);
        save_json_best_effort(store, keys::BEST_STREAK, &self.stored_best);
    }

    /// Record that the app was opened on `today`. Returns `true` on the
    /// first open of a new day.
    pub fn mark_opened(&mut self, store: &dyn KeyValueStore, today: DateKey) -> bool {
        let last: Option<DateKey> = load_json(store, keys::LAST_OPEN_DATE);
        save_json_best_effort(store, keys::LAST_OPEN_DATE, &today);
        if self.today != today {
            self.today = today;
            self.notify();
        }
        last != Some(today)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl Fn(&ProgressSnapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        self.stored_best = self.stored_best.max(snapshot.streak.best_streak);
        for (_, listener) in &self.listeners {
            listener(&snapshot);
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn today(&self) -> DateKey {
        self.today
    }

    pub fn tasks(&self) -> &[DailyTask] {
        &self.tasks
    }

    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn current_goal(&self) -> Option<&str> {
        self.current_goal.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn completed_keys(&self) -> BTreeSet<DateKey> {
        completed_date_keys(&self.tasks, self.current_goal.as_deref(), &self.challenges)
    }

    pub fn streak(&self) -> StreakData {
        self.calculator
            .calculate(&self.completed_keys(), self.stored_best, self.today)
    }

    /// Tasks under the current goal that fall on today.
    pub fn today_tasks(&self) -> impl Iterator<Item = &DailyTask> {
        let goal = self.current_goal.as_deref();
        let today = self.today;
        self.tasks.iter().filter(move |t| {
            Some(t.goal_id.as_str()) == goal && t.date.local_date_key() == Some(today)
        })
    }

    pub fn metrics(&self) -> ProgressMetrics {
        self.metrics_with(&self.streak())
    }

    fn metrics_with(&self, streak: &StreakData) -> ProgressMetrics {
        let completed_tasks = self.tasks.iter().filter(|t| t.completed).count()
            + self
                .challenges
                .iter()
                .map(Challenge::completed_subtasks)
                .sum::<usize>();
        let today_total = self.today_tasks().count();
        let today_completed = self.today_tasks().filter(|t| t.completed).count();

        ProgressMetrics {
            current_streak: streak.current_streak,
            total_completed_tasks: saturating_u32(completed_tasks),
            focus_time_minutes: self.focus_minutes,
            today_completed_tasks: saturating_u32(today_completed),
            today_total_tasks: saturating_u32(today_total),
            is_ready: self.ready,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let keys = self.completed_keys();
        let streak = self.calculator.calculate(&keys, self.stored_best, self.today);
        ProgressSnapshot {
            today: self.today,
            week: week_progress(&keys, self.today),
            metrics: self.metrics_with(&streak),
            streak,
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn mark_ready(&mut self) {
        self.ready = true;
        self.notify();
    }

    pub fn set_goal(&mut self, goal_id: impl Into<String>) {
        self.current_goal = Some(goal_id.into());
        self.notify();
    }

    pub fn clear_goal(&mut self) {
        self.current_goal = None;
        self.notify();
    }

    pub fn add_task(&mut self, task: DailyTask) -> &DailyTask {
        self.tasks.push(task);
        self.notify();
        let last = self.tasks.len() - 1;
        &self.tasks[last]
    }

    pub fn set_task_completed(&mut self, task_id: &str, completed: bool) -> Result<()> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| not_found("task", task_id))?;
        task.completed = completed;
        self.notify();
        Ok(())
    }

    pub fn remove_task(&mut self, task_id: &str) -> Result<DailyTask> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| not_found("task", task_id))?;
        let removed = self.tasks.remove(index);
        self.notify();
        Ok(removed)
    }

    pub fn add_challenge(&mut self, challenge: Challenge) {
        self.challenges.push(challenge);
        self.notify();
    }

    pub fn set_challenge_active(&mut self, challenge_id: &str, active: bool) -> Result<()> {
        self.challenge_mut(challenge_id)?.active = active;
        self.notify();
        Ok(())
    }

    /// Tick one checklist item on the challenge day that falls on `day`.
    pub fn complete_challenge_task(
        &mut self,
        challenge_id: &str,
        day: DateKey,
        subtask: usize,
    ) -> Result<()> {
        let challenge = self.challenge_mut(challenge_id)?;
        let challenge_day = challenge
            .day_mut(day)
            .ok_or_else(|| not_found("challenge day", &day.to_string()))?;
        let len = challenge_day.tasks.len();
        let item = challenge_day
            .tasks
            .get_mut(subtask)
            .ok_or_else(|| ValidationError::OutOfBounds {
                collection: "challenge checklist".into(),
                index: subtask,
                len,
            })?;
        item.completed = true;
        self.notify();
        Ok(())
    }

    pub fn add_focus_minutes(&mut self, minutes: u32) {
        self.focus_minutes = self.focus_minutes.saturating_add(minutes);
        self.notify();
    }

    /// Drop tasks dated before `cutoff`. The best streak survives pruning
    /// because it is carried in the stored best.
    pub fn prune_before(&mut self, cutoff: DateKey) -> usize {
        self.raise_stored_best();
        let before = self.tasks.len();
        self.tasks
            .retain(|t| t.date.local_date_key().map_or(true, |k| k >= cutoff));
        let pruned = before - self.tasks.len();
        if pruned > 0 {
            self.notify();
        }
        pruned
    }

    fn raise_stored_best(&mut self) {
        self.stored_best = self.stored_best.max(self.streak().best_streak);
    }

    fn challenge_mut(&mut self, challenge_id: &str) -> Result<&mut Challenge> {
        self.challenges
            .iter_mut()
            .find(|c| c.id == challenge_id)
            .ok_or_else(|| not_found("challenge", challenge_id).into())
    }
}

fn not_found(kind: &str, id: &str) -> ValidationError {
    ValidationError::NotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
