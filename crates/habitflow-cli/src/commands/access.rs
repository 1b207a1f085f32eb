use chrono::Utc;
use clap::Subcommand;
use habitflow_core::storage::Config;
use habitflow_core::subscription::{AccessGate, StoredSubscription};

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum AccessAction {
    /// Print premium/trial status
    Status,
    /// Start the free trial (no-op if already started)
    StartTrial,
}

pub fn run(action: AccessAction) -> CmdResult {
    let config = Config::load_or_default();
    let subscription = StoredSubscription::new(open_store()?);
    let gate = AccessGate::new(config.subscription.trial_days);
    let now = Utc::now();

    if let AccessAction::StartTrial = action {
        subscription.start_trial(now);
    }
    print_json(&gate.check(&subscription, now))?;
    Ok(())
}
