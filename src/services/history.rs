use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{ActivityRecord, FrequencyTable},
};

/// Source of a user's past story activity
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<ActivityRecord>>;
}

/// Per-dimension frequency tables for one user, rebuilt on every lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserHistory {
    pub universes: FrequencyTable,
    pub themes: FrequencyTable,
    pub characters: FrequencyTable,
    pub records: usize,
}

impl UserHistory {
    /// Every record counts once per ID it mentions; no decay, no recency weighting.
    pub fn from_records(records: &[ActivityRecord]) -> Self {
        let mut history = UserHistory {
            records: records.len(),
            ..Default::default()
        };

        for record in records {
            for universe_id in &record.universe_ids {
                history.universes.record(universe_id);
            }
            for character_id in &record.character_ids {
                history.characters.record(character_id);
            }
            if let Some(theme) = &record.theme {
                history.themes.record(theme);
            }
        }

        history
    }
}

/// Outcome of a history lookup.
///
/// Only `Found` carries a personalization signal; the other three all select
/// the popularity tier but are kept apart for logging.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryLookup {
    /// No user ID supplied
    Anonymous,
    /// User known to the store but without any records
    Empty,
    /// Store failed; treated as no history
    Unavailable,
    Found(UserHistory),
}

impl HistoryLookup {
    pub fn into_history(self) -> Option<UserHistory> {
        match self {
            HistoryLookup::Found(history) => Some(history),
            HistoryLookup::Anonymous | HistoryLookup::Empty | HistoryLookup::Unavailable => None,
        }
    }
}

/// Reduces a user's activity records to frequency tables
#[derive(Clone)]
pub struct HistoryAggregator {
    store: Arc<dyn HistoryStore>,
}

impl HistoryAggregator {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    pub async fn lookup(&self, user_id: Option<&str>) -> HistoryLookup {
        let Some(user_id) = user_id else {
            return HistoryLookup::Anonymous;
        };

        match self.store.find_by_user(user_id).await {
            Ok(records) if records.is_empty() => {
                tracing::debug!(user_id = %user_id, "No story history");
                HistoryLookup::Empty
            }
            Ok(records) => {
                let history = UserHistory::from_records(&records);
                tracing::debug!(
                    user_id = %user_id,
                    records = history.records,
                    universes = history.universes.len(),
                    themes = history.themes.len(),
                    "Aggregated story history"
                );
                HistoryLookup::Found(history)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "History store unavailable, falling back to popularity"
                );
                HistoryLookup::Unavailable
            }
        }
    }
}
