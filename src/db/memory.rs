use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{
    db::CacheStore,
    error::AppResult,
    models::ActivityRecord,
    services::history::HistoryStore,
};

/// A stored value and the instant it stops being readable
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Process-local cache store with passive expiry.
///
/// Expired entries are reported absent but stay in the map until the same
/// key is written again.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().await;
        let now = Utc::now();
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let expires_at = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = CacheEntry {
            key: key.to_string(),
            value,
            expires_at,
        };
        self.entries.write().await.insert(entry.key.clone(), entry);
        Ok(())
    }
}

/// Process-local history store, keyed by user
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    records: RwLock<HashMap<String, Vec<ActivityRecord>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: ActivityRecord) {
        self.records
            .write()
            .await
            .entry(record.user_id.clone())
            .or_default()
            .push(record);
    }
}

#[async_trait::async_trait]
impl HistoryStore for InMemoryHistory {
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<ActivityRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
