//! Fire-and-forget haptic feedback.
//!
//! The core never waits on, or learns the outcome of, a haptic pulse.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticKind {
    /// A breathing phase ended (emitted after exhale).
    PhaseChange,
    /// A reward modal was revealed.
    RewardReveal,
}

pub trait HapticSink {
    fn pulse(&self, kind: HapticKind);
}

/// Discards every pulse.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHaptics;

impl HapticSink for NoopHaptics {
    fn pulse(&self, _kind: HapticKind) {}
}

/// Counts pulses per kind.
#[derive(Debug, Default)]
pub struct RecordingHaptics {
    phase_changes: AtomicUsize,
    reward_reveals: AtomicUsize,
}

impl RecordingHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: HapticKind) -> usize {
        match kind {
            HapticKind::PhaseChange => self.phase_changes.load(Ordering::Relaxed),
            HapticKind::RewardReveal => self.reward_reveals.load(Ordering::Relaxed),
        }
    }
}

impl HapticSink for RecordingHaptics {
    fn pulse(&self, kind: HapticKind) {
        let counter = match kind {
            HapticKind::PhaseChange => &self.phase_changes,
            HapticKind::RewardReveal => &self.reward_reveals,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl<H: HapticSink + ?Sized> HapticSink for &H {
    fn pulse(&self, kind: HapticKind) {
        (**self).pulse(kind)
    }
}

impl<H: HapticSink + ?Sized> HapticSink for std::sync::Arc<H> {
    fn pulse(&self, kind: HapticKind) {
        (**self).pulse(kind)
    }
}
