use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::breathing::{BreathingSession, PhaseType, TimerState};
use crate::progress::ProgressSnapshot;
use crate::rewards::RewardCategory;

/// Every state change in the system produces an Event.
/// Front ends render them; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    BreathingStarted {
        session_id: String,
        technique_id: String,
        total_cycles: u32,
        at: DateTime<Utc>,
    },
    /// A new phase began (within the same or the next cycle).
    PhaseChanged {
        cycle: u32,
        phase_index: usize,
        phase_type: PhaseType,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        completed_cycles: u32,
        total_cycles: u32,
        at: DateTime<Utc>,
    },
    BreathingPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    BreathingResumed {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Session ended early; `session.completed` is false.
    BreathingStopped {
        session: BreathingSession,
        at: DateTime<Utc>,
    },
    /// Session ran every cycle. Emitted exactly once per session.
    BreathingCompleted {
        session: BreathingSession,
        at: DateTime<Utc>,
    },
    BreathingSnapshot {
        state: TimerState,
        technique_id: Option<String>,
        cycle: u32,
        phase_index: usize,
        phase_type: Option<PhaseType>,
        remaining_secs: u32,
        phase_progress: f64,
        session_progress: f64,
        at: DateTime<Utc>,
    },
    /// A reward was newly granted and marked seen.
    RewardUnlocked {
        reward_id: String,
        category: RewardCategory,
        at: DateTime<Utc>,
    },
    /// A reward modal became visible.
    RewardRevealed {
        reward_id: String,
        /// Rewards still waiting behind this one.
        queued: usize,
        at: DateTime<Utc>,
    },
    ProgressUpdated {
        snapshot: ProgressSnapshot,
        at: DateTime<Utc>,
    },
}
