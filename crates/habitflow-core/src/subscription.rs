//! Premium and trial gating.
//!
//! The purchase SDK is reduced to a boolean oracle behind
//! [`SubscriptionProvider`]. Access is derived from the provider on every
//! check; nothing caches a "blocked" flag, so a purchase or a clock change
//! takes effect on the next call.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::{keys, load_json, save_json_best_effort, KeyValueStore};

/// Source of purchase and trial state.
pub trait SubscriptionProvider {
    fn is_premium(&self) -> bool;
    fn trial_started_at(&self) -> Option<DateTime<Utc>>;
}

/// Provider backed by the key-value store.
pub struct StoredSubscription {
    store: Arc<dyn KeyValueStore>,
}

impl StoredSubscription {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Record the premium entitlement reported by the purchase backend.
    pub fn set_premium(&self, premium: bool) -> bool {
        save_json_best_effort(&*self.store, keys::PREMIUM, &premium)
    }

    /// Record the trial start if none exists yet; returns the effective start.
    pub fn start_trial(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        start_trial(&*self.store, now)
    }
}

impl SubscriptionProvider for StoredSubscription {
    fn is_premium(&self) -> bool {
        load_json(&*self.store, keys::PREMIUM).unwrap_or(false)
    }

    fn trial_started_at(&self) -> Option<DateTime<Utc>> {
        load_json(&*self.store, keys::TRIAL_STARTED_AT)
    }
}

/// Record the trial start once. Later calls keep the original timestamp.
pub fn start_trial(store: &dyn KeyValueStore, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(existing) = load_json::<DateTime<Utc>>(store, keys::TRIAL_STARTED_AT) {
        debug!(started_at = %existing, "trial already started");
        return existing;
    }
    save_json_best_effort(store, keys::TRIAL_STARTED_AT, &now);
    info!(started_at = %now, "trial started");
    now
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccessStatus {
    Premium,
    Trial {
        ends_at: DateTime<Utc>,
        /// Whole days left, rounded up.
        days_remaining: i64,
    },
    Expired {
        ended_at: DateTime<Utc>,
    },
    NotStarted,
}

impl AccessStatus {
    pub fn has_access(&self) -> bool {
        matches!(self, AccessStatus::Premium | AccessStatus::Trial { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AccessGate {
    trial_length: Duration,
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new(7)
    }
}

impl AccessGate {
    pub fn new(trial_days: u32) -> Self {
        Self {
            trial_length: Duration::days(i64::from(trial_days)),
        }
    }

    pub fn trial_length(&self) -> Duration {
        self.trial_length
    }

    pub fn check(&self, provider: &dyn SubscriptionProvider, now: DateTime<Utc>) -> AccessStatus {
        if provider.is_premium() {
            return AccessStatus::Premium;
        }
        let Some(started) = provider.trial_started_at() else {
            return AccessStatus::NotStarted;
        };
        let ends_at = started + self.trial_length;
        if now < ends_at {
            let left = ends_at - now;
            let mut days_remaining = left.num_days();
            if left > Duration::days(days_remaining) {
                days_remaining += 1;
            }
            AccessStatus::Trial {
                ends_at,
                days_remaining,
            }
        } else {
            AccessStatus::Expired { ended_at: ends_at }
        }
    }
}
