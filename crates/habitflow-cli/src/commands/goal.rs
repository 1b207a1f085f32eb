use clap::Subcommand;
use serde_json::json;

use super::{load_tracker, open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Make a goal current. Today's tasks and the streak follow it.
    Set {
        /// Goal identifier
        goal_id: String,
    },
    /// Print the current goal
    Show,
    /// Clear the current goal
    Clear,
}

pub fn run(action: GoalAction) -> CmdResult {
    let store = open_store()?;
    let mut tracker = load_tracker(&*store);

    match action {
        GoalAction::Set { goal_id } => {
            tracker.set_goal(goal_id);
            tracker.save(&*store);
        }
        GoalAction::Show => {}
        GoalAction::Clear => {
            tracker.clear_goal();
            tracker.save(&*store);
        }
    }

    print_json(&json!({ "current_goal": tracker.current_goal() }))?;
    Ok(())
}
