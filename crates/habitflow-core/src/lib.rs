//! # Habitflow Core Library
//!
//! This library provides the core logic for Habitflow, a habit and wellness
//! tracker. Every operation is available through the standalone `habitflow`
//! CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Progress**: Daily tasks, multi-day challenges and the unified streak
//!   computed across both
//! - **Breathing**: A tick-driven session state machine plus a tokio driver
//!   that ticks it once per second
//! - **Rewards**: An ordered catalog unlocked one stage at a time, with a
//!   queued reveal presentation
//! - **Storage**: SQLite key-value persistence and TOML configuration
//! - **Journal**: Entries and AI-generated reflections with a fallback
//!
//! ## Key Components
//!
//! - [`ProgressTracker`]: Task and challenge state with streak snapshots
//! - [`BreathingTimer`]: Breathing session state machine
//! - [`RewardGate`]: Sequenced reward unlocking
//! - [`AccessGate`]: Premium and trial gating
//! - [`Config`]: Application configuration management

pub mod breathing;
pub mod date_key;
pub mod error;
pub mod events;
pub mod haptics;
pub mod journal;
pub mod progress;
pub mod rewards;
pub mod storage;
pub mod subscription;

pub use breathing::{BreathingSession, BreathingTimer, Technique, TimerState};
pub use date_key::{get_local_date_key, normalize_date, parse_local_date_key, DateInput, DateKey};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use haptics::{HapticKind, HapticSink};
pub use journal::{Journal, JournalEntry};
pub use progress::{ProgressMetrics, ProgressSnapshot, ProgressTracker, StreakData};
pub use rewards::{Identity, Reward, RewardGate};
pub use storage::{Config, KeyValueStore, SqliteStore};
pub use subscription::{AccessGate, AccessStatus, SubscriptionProvider};
