//! Breathing session state machine.
//!
//! Like a metronome, the timer has no thread of its own: the caller invokes
//! [`BreathingTimer::tick`] once per second while the timer is running (see
//! [`super::runner`] for a tokio driver). All state lives in plain fields
//! and only the timer's own methods touch it.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Idle                  (all cycles done, BreathingCompleted)
//! Running | Paused -> Idle         (stop, BreathingStopped)
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::session::BreathingSession;
use super::technique::{PhaseType, Technique};
use crate::events::Event;
use crate::haptics::{HapticKind, HapticSink, NoopHaptics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Reasons a technique is refused at [`BreathingTimer::start`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("technique '{0}' has no phases")]
    NoPhases(String),

    #[error("technique '{technique_id}' phase {phase_index} has zero duration")]
    ZeroDuration {
        technique_id: String,
        phase_index: usize,
    },

    #[error("technique '{0}' has zero cycles")]
    NoCycles(String),
}

struct ActiveRun {
    technique: Technique,
    session: BreathingSession,
}

pub struct BreathingTimer<H: HapticSink = NoopHaptics> {
    haptics: H,
    haptics_enabled: bool,
    state: TimerState,
    active: Option<ActiveRun>,
    cycle: u32,
    phase_index: usize,
    remaining_secs: u32,
    history: Vec<BreathingSession>,
}

impl Default for BreathingTimer<NoopHaptics> {
    fn default() -> Self {
        Self::new(NoopHaptics)
    }
}

impl<H: HapticSink> BreathingTimer<H> {
    pub fn new(haptics: H) -> Self {
        Self {
            haptics,
            haptics_enabled: true,
            state: TimerState::Idle,
            active: None,
            cycle: 0,
            phase_index: 0,
            remaining_secs: 0,
            history: Vec::new(),
        }
    }

    /// Toggle the exhale pulse (platforms without vibration turn it off).
    pub fn with_haptics_enabled(mut self, enabled: bool) -> Self {
        self.haptics_enabled = enabled;
        self
    }

    /// Seed the history with previously finalized sessions.
    pub fn with_history(mut self, history: Vec<BreathingSession>) -> Self {
        self.history = history;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn technique(&self) -> Option<&Technique> {
        self.active.as_ref().map(|run| &run.technique)
    }

    pub fn current_session(&self) -> Option<&BreathingSession> {
        self.active.as_ref().map(|run| &run.session)
    }

    pub fn current_phase_type(&self) -> Option<PhaseType> {
        self.technique()
            .and_then(|t| t.phases.get(self.phase_index))
            .map(|p| p.phase_type)
    }

    /// Finalized sessions, oldest first.
    pub fn history(&self) -> &[BreathingSession] {
        &self.history
    }

    pub fn haptics(&self) -> &H {
        &self.haptics
    }

    /// 0.0 .. 1.0 elapsed fraction of the current phase.
    pub fn phase_progress(&self) -> f64 {
        let Some(duration) = self
            .technique()
            .and_then(|t| t.phases.get(self.phase_index))
            .map(|p| p.duration_secs)
        else {
            return 0.0;
        };
        if duration == 0 {
            return 0.0;
        }
        f64::from(duration - self.remaining_secs.min(duration)) / f64::from(duration)
    }

    /// 0.0 .. 1.0 progress across every phase of every cycle.
    pub fn session_progress(&self) -> f64 {
        let Some(technique) = self.technique() else {
            return 0.0;
        };
        let total = technique.total_phases();
        if total == 0 {
            return 0.0;
        }
        let done = u64::from(self.cycle) * technique.phases.len() as u64 + self.phase_index as u64;
        ((done as f64 + self.phase_progress()) / total as f64).min(1.0)
    }

    pub fn snapshot(&self) -> Event {
        Event::BreathingSnapshot {
            state: self.state,
            technique_id: self.technique().map(|t| t.id.clone()),
            cycle: self.cycle,
            phase_index: self.phase_index,
            phase_type: self.current_phase_type(),
            remaining_secs: self.remaining_secs,
            phase_progress: self.phase_progress(),
            session_progress: self.session_progress(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session. A session already in progress is stopped first.
    ///
    /// Invalid techniques are refused without touching any state.
    pub fn start(&mut self, technique: Technique) -> Result<Vec<Event>, TimerError> {
        if let Err(e) = validate(&technique) {
            warn!(technique_id = %technique.id, error = %e, "refusing breathing technique");
            return Err(e);
        }

        let mut events = Vec::new();
        if let Some(stopped) = self.stop() {
            events.push(stopped);
        }

        let now = Utc::now();
        let session = BreathingSession::begin(&technique.id, technique.cycles, now);
        let first = technique.phases[0].clone();

        self.cycle = 0;
        self.phase_index = 0;
        self.remaining_secs = first.duration_secs;
        self.state = TimerState::Running;

        events.push(Event::BreathingStarted {
            session_id: session.id.clone(),
            technique_id: technique.id.clone(),
            total_cycles: technique.cycles,
            at: now,
        });
        events.push(Event::PhaseChanged {
            cycle: 0,
            phase_index: 0,
            phase_type: first.phase_type,
            duration_secs: first.duration_secs,
            at: now,
        });
        debug!(technique_id = %technique.id, session_id = %session.id, "breathing session started");
        self.active = Some(ActiveRun { technique, session });
        Ok(events)
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        Some(Event::BreathingPaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.state = TimerState::Running;
        Some(Event::BreathingResumed {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// End the session early, recording the cycles actually finished.
    pub fn stop(&mut self) -> Option<Event> {
        if !matches!(self.state, TimerState::Running | TimerState::Paused) {
            return None;
        }
        let session = self.finalize(false)?;
        Some(Event::BreathingStopped {
            session,
            at: Utc::now(),
        })
    }

    /// Advance one second.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.state != TimerState::Running {
            return Vec::new();
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return Vec::new();
        }

        let mut events = Vec::new();
        let now = Utc::now();
        let finished_all = {
            let Some(run) = self.active.as_mut() else {
                self.state = TimerState::Idle;
                return events;
            };
            let phases = &run.technique.phases;

            if phases[self.phase_index].phase_type == PhaseType::Exhale && self.haptics_enabled {
                self.haptics.pulse(HapticKind::PhaseChange);
            }

            self.phase_index += 1;
            if self.phase_index >= phases.len() {
                self.phase_index = 0;
                self.cycle += 1;
                run.session.completed_cycles = self.cycle;
                events.push(Event::CycleCompleted {
                    completed_cycles: self.cycle,
                    total_cycles: run.technique.cycles,
                    at: now,
                });
            }

            if self.cycle >= run.technique.cycles {
                true
            } else {
                let next = &phases[self.phase_index];
                self.remaining_secs = next.duration_secs;
                events.push(Event::PhaseChanged {
                    cycle: self.cycle,
                    phase_index: self.phase_index,
                    phase_type: next.phase_type,
                    duration_secs: next.duration_secs,
                    at: now,
                });
                false
            }
        };

        if finished_all {
            if let Some(session) = self.finalize(true) {
                events.push(Event::BreathingCompleted { session, at: now });
            }
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Close the active session exactly once, append it to the history and
    /// return the timer to `Idle`.
    fn finalize(&mut self, completed: bool) -> Option<BreathingSession> {
        let ActiveRun { mut session, .. } = self.active.take()?;
        session.end_time = Some(Utc::now());
        session.completed = completed;
        session.completed_cycles = if completed {
            session.total_cycles
        } else {
            self.cycle
        };
        self.state = TimerState::Idle;
        self.cycle = 0;
        self.phase_index = 0;
        self.remaining_secs = 0;
        info!(
            session_id = %session.id,
            technique_id = %session.technique_id,
            completed,
            cycles = session.completed_cycles,
            "breathing session finalized"
        );
        self.history.push(session.clone());
        Some(session)
    }
}

fn validate(technique: &Technique) -> Result<(), TimerError> {
    if technique.phases.is_empty() {
        return Err(TimerError::NoPhases(technique.id.clone()));
    }
    if let Some(phase_index) = technique.phases.iter().position(|p| p.duration_secs == 0) {
        return Err(TimerError::ZeroDuration {
            technique_id: technique.id.clone(),
            phase_index,
        });
    }
    if technique.cycles == 0 {
        return Err(TimerError::NoCycles(technique.id.clone()));
    }
    Ok(())
}
