//! Daily journal entries with optional AI reflections.

mod insight;

pub use insight::{build_prompt, insight_or_fallback, InsightClient, InsightError};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::date_key::DateKey;
use crate::error::{Result, ValidationError};
use crate::storage::{keys, load_json, save_json_best_effort, KeyValueStore};

pub const MOOD_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub date: DateKey,
    pub created_at: DateTime<Utc>,
    pub content: String,
    /// 1 (low) to 5 (high).
    #[serde(default)]
    pub mood: Option<u8>,
    #[serde(default)]
    pub insight: Option<String>,
}

/// Journal entries kept in insertion order and written through to the store
/// after every change.
pub struct Journal {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries: Vec<JournalEntry> =
            load_json(&*store, keys::JOURNAL_ENTRIES).unwrap_or_default();
        debug!(count = entries.len(), "journal loaded");
        Self { store, entries }
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn entries_on(&self, date: DateKey) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |e| e.date == date)
    }

    pub fn get(&self, id: &str) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn add(
        &mut self,
        date: DateKey,
        content: &str,
        mood: Option<u8>,
        now: DateTime<Utc>,
    ) -> Result<&JournalEntry> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "content".into(),
                message: "journal entry is empty".into(),
            }
            .into());
        }
        if let Some(m) = mood {
            if !MOOD_RANGE.contains(&m) {
                return Err(ValidationError::InvalidValue {
                    field: "mood".into(),
                    message: format!("{m} is outside 1..=5"),
                }
                .into());
            }
        }

        self.entries.push(JournalEntry {
            id: Uuid::new_v4().to_string(),
            date,
            created_at: now,
            content: content.to_string(),
            mood,
            insight: None,
        });
        self.persist();
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    pub fn attach_insight(&mut self, id: &str, insight: impl Into<String>) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found(id))?;
        entry.insight = Some(insight.into());
        self.persist();
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<JournalEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| not_found(id))?;
        let removed = self.entries.remove(index);
        self.persist();
        Ok(removed)
    }

    fn persist(&self) {
        save_json_best_effort(&*self.store, keys::JOURNAL_ENTRIES, &self.entries);
    }
}

fn not_found(id: &str) -> ValidationError {
    ValidationError::NotFound {
        kind: "journal entry".into(),
        id: id.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::storage::MemoryStore;

    fn day(d: u32) -> DateKey {
        DateKey::from_ymd(2024, 3, d).unwrap()
    }

    #[test]
    fn entries_persist_and_filter_by_day() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut journal = Journal::load(Arc::clone(&store));
        let id = journal.add(day(4), "  slept well  ", Some(4), Utc::now()).unwrap().id.clone();
        journal.add(day(5), "long walk", None, Utc::now()).unwrap();
        journal.attach_insight(&id, "Rest is paying off.").unwrap();

        let reloaded = Journal::load(store);
        assert_eq!(reloaded.entries().len(), 2);
        let on_fourth: Vec<_> = reloaded.entries_on(day(4)).collect();
        assert_eq!(on_fourth.len(), 1);
        assert_eq!(on_fourth[0].content, "slept well");
        assert_eq!(on_fourth[0].insight.as_deref(), Some("Rest is paying off."));
    }

    #[test]
    fn rejects_empty_content_and_bad_mood() {
        let mut journal = Journal::load(Arc::new(MemoryStore::new()));
        assert!(matches!(
            journal.add(day(1), "   ", None, Utc::now()),
            Err(CoreError::Validation(ValidationError::InvalidValue { .. }))
        ));
        assert!(journal.add(day(1), "ok", Some(0), Utc::now()).is_err());
        assert!(journal.add(day(1), "ok", Some(6), Utc::now()).is_err());
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn remove_unknown_entry_is_not_found() {
        let mut journal = Journal::load(Arc::new(MemoryStore::new()));
        assert!(matches!(
            journal.remove("missing"),
            Err(CoreError::Validation(ValidationError::NotFound { .. }))
        ));
        let id = journal.add(day(2), "note", None, Utc::now()).unwrap().id.clone();
        assert_eq!(journal.remove(&id).unwrap().content, "note");
        assert!(journal.get(&id).is_none());
    }
}
