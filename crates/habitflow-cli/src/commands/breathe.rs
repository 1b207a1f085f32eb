use clap::Subcommand;
use habitflow_core::breathing::{
    builtin_techniques, drive, stop_on, technique_by_id, BreathingSession, BreathingTimer,
};
use habitflow_core::haptics::{HapticKind, RecordingHaptics};
use habitflow_core::storage::{keys, load_json, save_json_best_effort, Config};
use habitflow_core::Event;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::warn;

use super::{check_rewards, load_tracker, open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum BreatheAction {
    /// List built-in techniques
    List,
    /// Run a guided session in real time, one JSON event per line
    Run {
        /// Technique ID (default: breathing.default_technique)
        technique: Option<String>,
        /// Override the number of cycles
        #[arg(long)]
        cycles: Option<u32>,
    },
    /// Print finished sessions
    History,
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves,
/// leaving the default interrupt behavior in place.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn emit(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "failed to encode event"),
    }
}

pub fn run(action: BreatheAction) -> CmdResult {
    match action {
        BreatheAction::List => print_json(&builtin_techniques())?,
        BreatheAction::History => {
            let store = open_store()?;
            let history: Vec<BreathingSession> =
                load_json(&*store, keys::BREATHING_HISTORY).unwrap_or_default();
            print_json(&history)?;
        }
        BreatheAction::Run { technique, cycles } => {
            let config = Config::load_or_default();
            let id = technique.unwrap_or_else(|| config.breathing.default_technique.clone());
            let mut technique =
                technique_by_id(&id).ok_or_else(|| format!("unknown technique: {id}"))?;
            if let Some(cycles) = cycles {
                technique.cycles = cycles;
            }

            let store = open_store()?;
            let history: Vec<BreathingSession> =
                load_json(&*store, keys::BREATHING_HISTORY).unwrap_or_default();
            let mut timer = BreathingTimer::new(RecordingHaptics::new())
                .with_haptics_enabled(config.breathing.haptics)
                .with_history(history);

            for event in timer.start(technique)? {
                emit(&event);
            }

            // Ctrl-C stops the session so it is finalized and saved below.
            let (controls, rx) = mpsc::channel(4);
            let runtime = tokio::runtime::Runtime::new()?;
            let session = runtime.block_on(async {
                let interrupt = tokio::spawn(stop_on(interrupted(), controls));
                let session = drive(&mut timer, rx, emit).await;
                interrupt.abort();
                session
            });

            save_json_best_effort(&*store, keys::BREATHING_HISTORY, timer.history());

            let mut rewards = Vec::new();
            if let Some(finished) = session.as_ref().filter(|s| s.completed) {
                let mut tracker = load_tracker(&*store);
                tracker.add_focus_minutes(finished.duration_minutes());
                tracker.save(&*store);
                rewards = check_rewards(store.clone(), &tracker, &config);
            }

            print_json(&json!({
                "session": session,
                "haptic_pulses": timer.haptics().count(HapticKind::PhaseChange),
                "rewards": rewards,
            }))?;
        }
    }
    Ok(())
}
