use chrono::Utc;
use clap::Subcommand;
use habitflow_core::Event;
use serde::Serialize;

use super::{open_store, open_tracker, print_json, CmdResult};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Print streak, week and today's figures
    Show,
}

#[derive(Serialize)]
struct StreakReport {
    #[serde(flatten)]
    update: Event,
    first_open_today: bool,
}

pub fn run(action: StreakAction) -> CmdResult {
    let store = open_store()?;
    let (tracker, first_open_today) = open_tracker(&*store);

    match action {
        StreakAction::Show => print_json(&StreakReport {
            update: Event::ProgressUpdated {
                snapshot: tracker.snapshot(),
                at: Utc::now(),
            },
            first_open_today,
        })?,
    }
    Ok(())
}
