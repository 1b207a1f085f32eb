use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One run of a technique. Only the timer mutates it, and only until it is
/// finalized; after that it lives unchanged in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathingSession {
    pub id: String,
    pub technique_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub completed_cycles: u32,
    pub total_cycles: u32,
    pub completed: bool,
}

impl BreathingSession {
    pub(crate) fn begin(technique_id: &str, total_cycles: u32, at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            technique_id: technique_id.to_string(),
            start_time: at,
            end_time: None,
            completed_cycles: 0,
            total_cycles,
            completed: false,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }

    /// Whole minutes between start and end, rounded up so that short
    /// sessions still register. Zero for unfinished sessions.
    pub fn duration_minutes(&self) -> u32 {
        let Some(end) = self.end_time else {
            return 0;
        };
        let secs = (end - self.start_time).num_seconds().max(0);
        u32::try_from((secs + 59) / 60).unwrap_or(u32::MAX)
    }
}
