mod config;
pub mod kv;

pub use config::{BreathingConfig, Config, InsightsConfig, RewardsConfig, SubscriptionConfig};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore};

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::StorageError;

/// Well-known keys in the key-value store.
pub mod keys {
    pub const TASKS: &str = "progress.tasks";
    pub const CHALLENGES: &str = "progress.challenges";
    pub const CURRENT_GOAL: &str = "progress.current_goal";
    pub const BEST_STREAK: &str = "progress.best_streak";
    pub const FOCUS_MINUTES: &str = "progress.focus_minutes";
    pub const LAST_OPEN_DATE: &str = "progress.last_open_date";
    pub const SEEN_REWARDS: &str = "rewards.seen";
    pub const TRIAL_STARTED_AT: &str = "subscription.trial_started_at";
    pub const PREMIUM: &str = "subscription.premium";
    pub const JOURNAL_ENTRIES: &str = "journal.entries";
    pub const BREATHING_HISTORY: &str = "breathing.history";
}

/// Returns the data directory.
///
/// `HABITFLOW_DATA_DIR` wins when set. Otherwise `~/.config/habitflow[-dev]/`,
/// with `HABITFLOW_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("HABITFLOW_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HABITFLOW_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitflow-dev")
            } else {
                base_dir.join("habitflow")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Read and decode a JSON value. Missing keys, read failures and
/// undecodable payloads all come back as `None`; the latter two are logged.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "store read failed; using defaults");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "ignoring undecodable stored value");
            None
        }
    }
}

/// Encode and write a JSON value, logging and discarding any failure.
///
/// Returns whether the write landed, for callers that want to report it.
pub fn save_json_best_effort<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> bool {
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!(key, error = %e, "failed to encode value for store");
            return false;
        }
    };
    match store.set(key, &encoded) {
        Ok(()) => true,
        Err(e) => {
            warn!(key, error = %e, "store write failed; keeping in-memory state");
            false
        }
    }
}

/// Remove a key, logging and discarding any failure.
pub fn remove_best_effort(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        warn!(key, error = %e, "store remove failed");
    }
}
