//! Guided breathing: techniques, the session state machine, and a
//! one-second driver.

pub mod runner;
mod session;
mod technique;
mod timer;

pub use runner::{drive, stop_on, TimerControl, TICK_PERIOD};
pub use session::BreathingSession;
pub use technique::{builtin_techniques, technique_by_id, Phase, PhaseType, Technique};
pub use timer::{BreathingTimer, TimerError, TimerState};
