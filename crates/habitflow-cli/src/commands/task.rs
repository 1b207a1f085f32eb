use clap::Subcommand;
use habitflow_core::progress::DailyTask;
use habitflow_core::storage::Config;
use habitflow_core::DateKey;
use serde_json::json;

use super::{check_rewards, load_tracker, open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task for a day
    Add {
        /// Task title
        title: String,
        /// Day the task belongs to (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<DateKey>,
        /// Goal the task counts toward (default: current goal)
        #[arg(long)]
        goal: Option<String>,
    },
    /// Mark a task complete and check for rewards
    Complete {
        /// Task ID
        id: String,
        /// Mark the task incomplete instead
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    Remove {
        /// Task ID
        id: String,
    },
    /// List tasks (today's tasks under the current goal by default)
    List {
        /// Include every stored task
        #[arg(long)]
        all: bool,
    },
}

pub fn run(action: TaskAction) -> CmdResult {
    let store = open_store()?;
    let mut tracker = load_tracker(&*store);

    match action {
        TaskAction::Add { title, date, goal } => {
            let goal = match goal.or_else(|| tracker.current_goal().map(str::to_string)) {
                Some(goal) => goal,
                None => return Err("no goal given and no current goal set".into()),
            };
            let date = date.unwrap_or_else(|| tracker.today());
            let task = tracker.add_task(DailyTask::new(title, date, goal)).clone();
            tracker.save(&*store);
            print_json(&task)?;
        }
        TaskAction::Complete { id, undo } => {
            tracker.set_task_completed(&id, !undo)?;
            tracker.save(&*store);
            let rewards = check_rewards(store.clone(), &tracker, &Config::load_or_default());
            let task = tracker.tasks().iter().find(|t| t.id == id);
            print_json(&json!({
                "task": task,
                "metrics": tracker.metrics(),
                "rewards": rewards,
            }))?;
        }
        TaskAction::Remove { id } => {
            let removed = tracker.remove_task(&id)?;
            tracker.save(&*store);
            print_json(&removed)?;
        }
        TaskAction::List { all } => {
            if all {
                print_json(tracker.tasks())?;
            } else {
                let today: Vec<_> = tracker.today_tasks().collect();
                print_json(&today)?;
            }
        }
    }
    Ok(())
}
