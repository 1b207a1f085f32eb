//! Reward sequencing gate.
//!
//! Rewards unlock strictly in catalog order. A scan walks the catalog,
//! passes over rewards already seen, grants rewards that qualify under the
//! current metrics, and stops at the first reward that is neither. A user
//! importing a large streak therefore still sees every stage, one at a time.
//!
//! ## Presentation
//!
//! Newly granted rewards are recorded as seen immediately, then shown one
//! modal at a time: the first right away if nothing is on screen, the rest
//! after `modal_delay` following each close, one per [`RewardGate::poll`].

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::catalog::{default_catalog, Reward, RewardStatus};
use crate::events::Event;
use crate::haptics::{HapticKind, HapticSink, NoopHaptics};
use crate::progress::ProgressMetrics;
use crate::storage::{keys, load_json, save_json_best_effort, KeyValueStore};

/// Who is evaluating rewards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    #[default]
    Regular,
    /// Every reward qualifies and the full-day precondition is skipped.
    Developer,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("test rewards require developer mode")]
    DeveloperOnly,

    #[error("reward catalog is empty")]
    EmptyCatalog,
}

pub struct RewardGate<H: HapticSink = NoopHaptics> {
    store: Arc<dyn KeyValueStore>,
    catalog: Vec<Reward>,
    seen: BTreeSet<String>,
    identity: Identity,
    require_full_day: bool,
    modal_delay: Duration,
    haptics: H,
    active: Option<Reward>,
    queue: VecDeque<Reward>,
    next_reveal_at: Option<DateTime<Utc>>,
}

impl RewardGate<NoopHaptics> {
    /// Gate over the default catalog, restoring the seen set from `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let seen = load_json::<BTreeSet<String>>(&*store, keys::SEEN_REWARDS).unwrap_or_default();
        Self {
            store,
            catalog: default_catalog(),
            seen,
            identity: Identity::Regular,
            require_full_day: true,
            modal_delay: Duration::milliseconds(500),
            haptics: NoopHaptics,
            active: None,
            queue: VecDeque::new(),
            next_reveal_at: None,
        }
    }
}

impl<H: HapticSink> RewardGate<H> {
    pub fn with_catalog(mut self, catalog: Vec<Reward>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_full_day_required(mut self, required: bool) -> Self {
        self.require_full_day = required;
        self
    }

    pub fn with_modal_delay(mut self, delay: Duration) -> Self {
        self.modal_delay = delay;
        self
    }

    pub fn with_haptics<H2: HapticSink>(self, haptics: H2) -> RewardGate<H2> {
        RewardGate {
            store: self.store,
            catalog: self.catalog,
            seen: self.seen,
            identity: self.identity,
            require_full_day: self.require_full_day,
            modal_delay: self.modal_delay,
            haptics,
            active: self.active,
            queue: self.queue,
            next_reveal_at: self.next_reveal_at,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn catalog(&self) -> &[Reward] {
        &self.catalog
    }

    pub fn is_seen(&self, reward_id: &str) -> bool {
        self.seen.contains(reward_id)
    }

    pub fn seen(&self) -> &BTreeSet<String> {
        &self.seen
    }

    /// The reward modal currently on screen.
    pub fn active(&self) -> Option<&Reward> {
        self.active.as_ref()
    }

    pub fn modal_delay(&self) -> Duration {
        self.modal_delay
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn haptics(&self) -> &H {
        &self.haptics
    }

    pub fn statuses(&self, metrics: &ProgressMetrics) -> Vec<RewardStatus> {
        self.catalog
            .iter()
            .map(|reward| RewardStatus {
                unlocked: self.seen.contains(&reward.id),
                qualifies: self.identity == Identity::Developer || reward.qualifies(metrics),
                reward: reward.clone(),
            })
            .collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Grant every reward that is next in line and qualifies.
    ///
    /// Skipped until progress is ready, and (for regular users) until every
    /// task tracked for today is complete. Re-running while a modal is open
    /// only adds to the queue.
    pub fn evaluate(&mut self, metrics: &ProgressMetrics, now: DateTime<Utc>) -> Vec<Event> {
        if !metrics.is_ready {
            debug!("progress not ready; skipping reward scan");
            return Vec::new();
        }
        let bypass = self.identity == Identity::Developer;
        if !bypass && self.require_full_day && !metrics.day_complete() {
            debug!(
                completed = metrics.today_completed_tasks,
                total = metrics.today_total_tasks,
                "day not complete; skipping reward scan"
            );
            return Vec::new();
        }

        let mut granted = Vec::new();
        for reward in &self.catalog {
            if self.seen.contains(&reward.id) {
                continue;
            }
            if bypass || reward.qualifies(metrics) {
                granted.push(reward.clone());
            } else {
                break;
            }
        }

        if granted.is_empty() {
            return Vec::new();
        }
        self.grant(granted, now)
    }

    /// Developer shortcut: grant the first unseen reward, or start the
    /// sequence over when everything has been seen.
    pub fn trigger_test_reward(&mut self, now: DateTime<Utc>) -> Result<Vec<Event>, GateError> {
        if self.identity != Identity::Developer {
            warn!("test reward requested without developer mode");
            return Err(GateError::DeveloperOnly);
        }
        let next = match self.catalog.iter().find(|r| !self.seen.contains(&r.id)) {
            Some(reward) => reward.clone(),
            None => {
                let first = self.catalog.first().cloned().ok_or(GateError::EmptyCatalog)?;
                info!("all rewards seen; restarting the sequence");
                self.seen.clear();
                first
            }
        };
        Ok(self.grant(vec![next], now))
    }

    /// Dismiss the modal on screen. The next queued reward becomes
    /// available to [`poll`](Self::poll) after the modal delay.
    pub fn close_modal(&mut self, now: DateTime<Utc>) -> Option<Reward> {
        let closed = self.active.take()?;
        if !self.queue.is_empty() {
            self.next_reveal_at = Some(now + self.modal_delay);
        }
        Some(closed)
    }

    /// Reveal at most one queued reward if its delay has elapsed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.active.is_some() {
            return None;
        }
        match self.next_reveal_at {
            Some(at) if at <= now => {
                self.next_reveal_at = None;
                self.reveal_next(now)
            }
            _ => None,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn grant(&mut self, rewards: Vec<Reward>, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::with_capacity(rewards.len() + 1);
        for reward in &rewards {
            self.seen.insert(reward.id.clone());
            info!(reward_id = %reward.id, category = ?reward.category, "reward unlocked");
            events.push(Event::RewardUnlocked {
                reward_id: reward.id.clone(),
                category: reward.category,
                at: now,
            });
        }
        save_json_best_effort(&*self.store, keys::SEEN_REWARDS, &self.seen);

        self.queue.extend(rewards);
        if self.active.is_none() && self.next_reveal_at.is_none() {
            events.extend(self.reveal_next(now));
        }
        events
    }

    fn reveal_next(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let reward = self.queue.pop_front()?;
        self.haptics.pulse(HapticKind::RewardReveal);
        let event = Event::RewardRevealed {
            reward_id: reward.id.clone(),
            queued: self.queue.len(),
            at: now,
        };
        self.active = Some(reward);
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haptics::RecordingHaptics;
    use crate::rewards::RewardCategory;
    use crate::storage::MemoryStore;

    fn abc() -> Vec<Reward> {
        vec![
            Reward::new("a", "A", RewardCategory::Streak, 5),
            Reward::new("b", "B", RewardCategory::Streak, 10),
            Reward::new("c", "C", RewardCategory::Streak, 15),
        ]
    }

    fn finished_day(streak: u32) -> ProgressMetrics {
        ProgressMetrics {
            current_streak: streak,
            today_completed_tasks: 5,
            today_total_tasks: 5,
            is_ready: true,
            ..Default::default()
        }
    }

    fn unlocked(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::RewardUnlocked { reward_id, .. } => Some(reward_id.clone()),
                _ => None,
            })
            .collect()
    }

    fn gate() -> RewardGate {
        RewardGate::new(Arc::new(MemoryStore::new())).with_catalog(abc())
    }

    #[test]
    fn unlocks_in_order_and_withholds_the_rest() {
        let mut gate = gate();
        let now = Utc::now();

        let events = gate.evaluate(&finished_day(12), now);
        assert_eq!(unlocked(&events), vec!["a", "b"]);
        assert!(!gate.is_seen("c"));

        // Nothing new on a re-run with the same metrics.
        assert!(unlocked(&gate.evaluate(&finished_day(12), now)).is_empty());

        let events = gate.evaluate(&finished_day(15), now);
        assert_eq!(unlocked(&events), vec!["c"]);
    }

    #[test]
    fn scan_stops_at_first_unqualified_reward() {
        let mut gate = RewardGate::new(Arc::new(MemoryStore::new())).with_catalog(vec![
            Reward::new("tasks", "T", RewardCategory::Tasks, 100),
            Reward::new("streak", "S", RewardCategory::Streak, 1),
        ]);
        assert!(gate.evaluate(&finished_day(5), Utc::now()).is_empty());
        assert!(!gate.is_seen("streak"));
    }

    #[test]
    fn incomplete_day_grants_nothing() {
        let mut gate = gate();
        let metrics = ProgressMetrics {
            current_streak: 100,
            today_completed_tasks: 3,
            today_total_tasks: 5,
            is_ready: true,
            ..Default::default()
        };
        assert!(gate.evaluate(&metrics, Utc::now()).is_empty());
        assert!(gate.seen().is_empty());

        let no_tasks = ProgressMetrics {
            today_completed_tasks: 0,
            today_total_tasks: 0,
            ..metrics
        };
        assert!(gate.evaluate(&no_tasks, Utc::now()).is_empty());
    }

    #[test]
    fn full_day_requirement_can_be_relaxed() {
        let mut gate = gate().with_full_day_required(false);
        let metrics = ProgressMetrics {
            current_streak: 6,
            today_completed_tasks: 1,
            today_total_tasks: 5,
            is_ready: true,
            ..Default::default()
        };
        assert_eq!(unlocked(&gate.evaluate(&metrics, Utc::now())), vec!["a"]);
    }

    #[test]
    fn not_ready_grants_nothing() {
        let mut gate = gate();
        let metrics = ProgressMetrics {
            is_ready: false,
            ..finished_day(20)
        };
        assert!(gate.evaluate(&metrics, Utc::now()).is_empty());
    }

    #[test]
    fn developer_qualifies_everything() {
        let mut gate = gate().with_identity(Identity::Developer);
        let metrics = ProgressMetrics {
            is_ready: true,
            today_total_tasks: 4,
            ..Default::default()
        };
        let events = gate.evaluate(&metrics, Utc::now());
        assert_eq!(unlocked(&events), vec!["a", "b", "c"]);
        assert!(gate.statuses(&metrics).iter().all(|s| s.unlocked && s.qualifies));
    }

    #[test]
    fn modals_are_shown_one_at_a_time() {
        let mut gate = gate().with_haptics(RecordingHaptics::new());
        let t0 = Utc::now();

        let events = gate.evaluate(&finished_day(20), t0);
        assert!(matches!(
            events.last(),
            Some(Event::RewardRevealed { queued: 2, .. })
        ));
        assert_eq!(gate.active().unwrap().id, "a");
        assert_eq!(gate.queued(), 2);
        assert!(gate.poll(t0 + Duration::seconds(5)).is_none());

        let t1 = t0 + Duration::seconds(1);
        assert_eq!(gate.close_modal(t1).unwrap().id, "a");
        assert!(gate.poll(t1 + Duration::milliseconds(499)).is_none());
        assert!(gate.poll(t1 + Duration::milliseconds(500)).is_some());
        assert_eq!(gate.active().unwrap().id, "b");
        // One per call.
        assert!(gate.poll(t1 + Duration::seconds(10)).is_none());

        let t2 = t1 + Duration::seconds(2);
        gate.close_modal(t2);
        assert!(gate.poll(t2 + Duration::milliseconds(500)).is_some());
        assert_eq!(gate.active().unwrap().id, "c");
        gate.close_modal(t2 + Duration::seconds(1));
        assert!(gate.active().is_none());
        assert!(gate.poll(t2 + Duration::seconds(5)).is_none());

        assert_eq!(gate.haptics().count(HapticKind::RewardReveal), 3);
    }

    #[test]
    fn evaluation_while_modal_open_only_enqueues() {
        let mut gate = gate();
        let now = Utc::now();
        gate.evaluate(&finished_day(5), now);
        assert_eq!(gate.active().unwrap().id, "a");

        let events = gate.evaluate(&finished_day(10), now);
        assert_eq!(unlocked(&events), vec!["b"]);
        assert!(!events.iter().any(|e| matches!(e, Event::RewardRevealed { .. })));
        assert_eq!(gate.active().unwrap().id, "a");
        assert_eq!(gate.queued(), 1);
    }

    #[test]
    fn seen_set_persists_across_gates() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut first = RewardGate::new(Arc::clone(&store)).with_catalog(abc());
        first.evaluate(&finished_day(10), Utc::now());

        let mut second = RewardGate::new(store).with_catalog(abc());
        assert!(second.is_seen("a") && second.is_seen("b"));
        assert!(second.evaluate(&finished_day(10), Utc::now()).is_empty());
    }

    #[test]
    fn test_reward_requires_developer_and_wraps_around() {
        let now = Utc::now();
        assert_eq!(
            gate().trigger_test_reward(now).unwrap_err(),
            GateError::DeveloperOnly
        );

        let mut gate = gate().with_identity(Identity::Developer);
        for expected in ["a", "b", "c"] {
            let events = gate.trigger_test_reward(now).unwrap();
            assert_eq!(unlocked(&events), vec![expected]);
        }
        let events = gate.trigger_test_reward(now).unwrap();
        assert_eq!(unlocked(&events), vec!["a"]);
        assert_eq!(gate.seen().len(), 1);

        let mut empty = RewardGate::new(Arc::new(MemoryStore::new()))
            .with_catalog(Vec::new())
            .with_identity(Identity::Developer);
        assert_eq!(empty.trigger_test_reward(now).unwrap_err(), GateError::EmptyCatalog);
    }
}
