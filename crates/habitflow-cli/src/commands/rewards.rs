use chrono::Utc;
use clap::Subcommand;
use habitflow_core::storage::Config;

use super::{check_rewards, drain_reveals, load_tracker, open_store, print_json, reward_gate, CmdResult};

#[derive(Subcommand)]
pub enum RewardsAction {
    /// List the catalog with unlock state
    List,
    /// Scan for newly earned rewards
    Check,
    /// Grant the next reward regardless of progress (developer mode only)
    Test,
}

pub fn run(action: RewardsAction) -> CmdResult {
    let store = open_store()?;
    let config = Config::load_or_default();
    let tracker = load_tracker(&*store);

    match action {
        RewardsAction::List => {
            let gate = reward_gate(store, &config);
            print_json(&gate.statuses(&tracker.metrics()))?;
        }
        RewardsAction::Check => {
            print_json(&check_rewards(store, &tracker, &config))?;
        }
        RewardsAction::Test => {
            let mut gate = reward_gate(store, &config);
            let now = Utc::now();
            let mut events = gate.trigger_test_reward(now)?;
            events.extend(drain_reveals(&mut gate, now));
            print_json(&events)?;
        }
    }
    Ok(())
}
