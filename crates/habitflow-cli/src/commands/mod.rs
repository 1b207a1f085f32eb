pub mod access;
pub mod breathe;
pub mod challenge;
pub mod config;
pub mod goal;
pub mod journal;
pub mod rewards;
pub mod streak;
pub mod task;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use habitflow_core::date_key::today_key;
use habitflow_core::rewards::{Identity, RewardGate};
use habitflow_core::storage::{Config, KeyValueStore, SqliteStore};
use habitflow_core::{Event, ProgressTracker};
use serde::Serialize;
use tracing::debug;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn open_store() -> Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error>> {
    Ok(Arc::new(SqliteStore::open()?))
}

/// Load progress and record today's open. The flag is `true` for the first
/// command run on a new day.
pub fn open_tracker(store: &dyn KeyValueStore) -> (ProgressTracker, bool) {
    let mut tracker = ProgressTracker::load(store, today_key());
    let first_open = tracker.mark_opened(store, today_key());
    if first_open {
        debug!(today = %tracker.today(), "first open of the day");
    }
    (tracker, first_open)
}

pub fn load_tracker(store: &dyn KeyValueStore) -> ProgressTracker {
    open_tracker(store).0
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn reward_gate(store: Arc<dyn KeyValueStore>, config: &Config) -> RewardGate {
    let identity = if config.rewards.developer_mode {
        Identity::Developer
    } else {
        Identity::Regular
    };
    RewardGate::new(store)
        .with_identity(identity)
        .with_full_day_required(config.rewards.require_full_day)
        .with_modal_delay(config.rewards.modal_delay())
}

/// Run the reward scan after a progress change and lay out the full
/// presentation: each queued modal appears one delay after the previous
/// one is dismissed.
pub fn check_rewards(
    store: Arc<dyn KeyValueStore>,
    tracker: &ProgressTracker,
    config: &Config,
) -> Vec<Event> {
    let mut gate = reward_gate(store, config);
    let now = Utc::now();
    let mut events = gate.evaluate(&tracker.metrics(), now);
    events.extend(drain_reveals(&mut gate, now));
    events
}

pub fn drain_reveals(gate: &mut RewardGate, mut now: DateTime<Utc>) -> Vec<Event> {
    let mut events = Vec::new();
    while gate.close_modal(now).is_some() {
        now += gate.modal_delay();
        match gate.poll(now) {
            Some(event) => events.push(event),
            None => break,
        }
    }
    events
}
