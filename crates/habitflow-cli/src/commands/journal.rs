use chrono::Utc;
use clap::Subcommand;
use habitflow_core::date_key::today_key;
use habitflow_core::journal::{build_prompt, insight_or_fallback, Journal};
use habitflow_core::storage::Config;
use habitflow_core::DateKey;

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum JournalAction {
    /// Write an entry
    Add {
        /// Entry text
        content: String,
        /// Mood from 1 to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        mood: Option<u8>,
        /// Day of the entry (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<DateKey>,
    },
    /// List entries
    List {
        /// Only entries for this day
        #[arg(long)]
        date: Option<DateKey>,
    },
    /// Ask for a reflection on an entry and store it
    Insight {
        /// Entry ID
        id: String,
    },
}

pub fn run(action: JournalAction) -> CmdResult {
    let store = open_store()?;
    let mut journal = Journal::load(store);

    match action {
        JournalAction::Add {
            content,
            mood,
            date,
        } => {
            let date = date.unwrap_or_else(today_key);
            let entry = journal.add(date, &content, mood, Utc::now())?;
            print_json(entry)?;
        }
        JournalAction::List { date } => match date {
            Some(day) => {
                let entries: Vec<_> = journal.entries_on(day).collect();
                print_json(&entries)?;
            }
            None => print_json(journal.entries())?,
        },
        JournalAction::Insight { id } => {
            let entry = journal
                .get(&id)
                .ok_or_else(|| format!("journal entry not found: {id}"))?;
            let prompt = build_prompt(std::slice::from_ref(entry));
            let config = Config::load_or_default();
            let runtime = tokio::runtime::Runtime::new()?;
            let insight = runtime.block_on(insight_or_fallback(&config.insights, &prompt));
            journal.attach_insight(&id, insight)?;
            print_json(&journal.get(&id))?;
        }
    }
    Ok(())
}
