use clap::Subcommand;
use habitflow_core::progress::Challenge;
use habitflow_core::storage::Config;
use habitflow_core::DateKey;
use serde_json::json;

use super::{check_rewards, load_tracker, open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Create a challenge of consecutive days
    Add {
        /// Challenge title
        title: String,
        /// Number of days
        #[arg(long, default_value = "7")]
        days: u32,
        /// First day (YYYY-MM-DD, default today)
        #[arg(long)]
        start: Option<DateKey>,
        /// Checklist item for every day (repeatable)
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,
    },
    /// Tick a checklist item on a challenge day and check for rewards
    Check {
        /// Challenge ID
        id: String,
        /// Zero-based checklist index
        index: usize,
        /// Challenge day (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<DateKey>,
    },
    /// Pause a challenge so it stops counting toward the streak
    Pause {
        /// Challenge ID
        id: String,
        /// Reactivate instead
        #[arg(long)]
        resume: bool,
    },
    /// List challenges
    List,
}

pub fn run(action: ChallengeAction) -> CmdResult {
    let store = open_store()?;
    let mut tracker = load_tracker(&*store);

    match action {
        ChallengeAction::Add {
            title,
            days,
            start,
            tasks,
        } => {
            let start = start.unwrap_or_else(|| tracker.today());
            let challenge = Challenge::consecutive(title, start, days, &tasks)?;
            print_json(&challenge)?;
            tracker.add_challenge(challenge);
            tracker.save(&*store);
        }
        ChallengeAction::Check { id, index, date } => {
            let day = date.unwrap_or_else(|| tracker.today());
            tracker.complete_challenge_task(&id, day, index)?;
            tracker.save(&*store);
            let rewards = check_rewards(store.clone(), &tracker, &Config::load_or_default());
            print_json(&json!({
                "challenge": tracker.challenges().iter().find(|c| c.id == id),
                "metrics": tracker.metrics(),
                "rewards": rewards,
            }))?;
        }
        ChallengeAction::Pause { id, resume } => {
            tracker.set_challenge_active(&id, resume)?;
            tracker.save(&*store);
            print_json(&json!({ "id": id, "active": resume }))?;
        }
        ChallengeAction::List => print_json(tracker.challenges())?,
    }
    Ok(())
}
