use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One story a user created, as recorded by the history store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub user_id: String,
    pub universe_ids: BTreeSet<String>,
    #[serde(default)]
    pub character_ids: BTreeSet<String>,
    #[serde(default)]
    pub theme: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn new<I, S>(user_id: impl Into<String>, universe_ids: I, theme: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id: user_id.into(),
            universe_ids: universe_ids.into_iter().map(Into::into).collect(),
            character_ids: BTreeSet::new(),
            theme: theme.map(str::to_string),
            timestamp: Utc::now(),
        }
    }

    pub fn with_characters<I, S>(mut self, character_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.character_ids = character_ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Occurrence count per entity ID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<String, u32>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: &str) {
        *self.counts.entry(id.to_string()).or_insert(0) += 1;
    }

    /// Zero for IDs never seen
    pub fn count(&self, id: &str) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

impl<'a> FromIterator<&'a str> for FrequencyTable {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut table = FrequencyTable::new();
        for id in iter {
            table.record(id);
        }
        table
    }
}
