use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{AgeGroup, CharacterRole};

/// Every recommendation type is cached for one hour
pub const CACHE_TTL: u64 = 3600;

/// Rendering of an absent optional parameter. No escaped value can produce it.
const ABSENT: &str = "%00";

/// Key-value store with per-key expiry, holding JSON strings
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()>;
}

/// Cache key for one recommendation request.
///
/// The rendered form is injective: two requests that differ in any parameter
/// render differently, identical requests always render the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Universes {
        user_id: Option<String>,
        age_group: AgeGroup,
        limit: usize,
    },
    Characters {
        universe_id: String,
        user_id: Option<String>,
        role: Option<CharacterRole>,
        limit: usize,
    },
    Themes {
        user_id: Option<String>,
        age_group: AgeGroup,
        universe_ids: Vec<String>,
        limit: usize,
    },
    MoralLessons {
        user_id: Option<String>,
        age_group: AgeGroup,
        theme: Option<String>,
        limit: usize,
    },
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            ',' => out.push_str("%2C"),
            c => out.push(c),
        }
    }
    out
}

fn optional(value: Option<&str>) -> String {
    value.map(escape).unwrap_or_else(|| ABSENT.to_string())
}

/// Length-prefixed so that `[]` and `[""]` stay distinct
fn list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| escape(v)).collect();
    format!("{}[{}]", values.len(), items.join(","))
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Universes {
                user_id,
                age_group,
                limit,
            } => write!(
                f,
                "rec:universes:{}:{}:{}",
                optional(user_id.as_deref()),
                age_group,
                limit
            ),
            CacheKey::Characters {
                universe_id,
                user_id,
                role,
                limit,
            } => write!(
                f,
                "rec:characters:{}:{}:{}:{}",
                escape(universe_id),
                optional(user_id.as_deref()),
                optional(role.map(|r| r.as_str())),
                limit
            ),
            CacheKey::Themes {
                user_id,
                age_group,
                universe_ids,
                limit,
            } => write!(
                f,
                "rec:themes:{}:{}:{}:{}",
                optional(user_id.as_deref()),
                age_group,
                list(universe_ids),
                limit
            ),
            CacheKey::MoralLessons {
                user_id,
                age_group,
                theme,
                limit,
            } => write!(
                f,
                "rec:morals:{}:{}:{}:{}",
                optional(user_id.as_deref()),
                age_group,
                optional(theme.as_deref()),
                limit
            ),
        }
    }
}

/// Typed, fail-open view over a [`CacheStore`].
///
/// Store errors and undecodable values are logged and reported as a miss;
/// failed writes are logged and dropped. With no store attached every read
/// misses.
#[derive(Clone)]
pub struct RecommendationCache {
    store: Option<Arc<dyn CacheStore>>,
}

impl RecommendationCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let store = self.store.as_ref()?;
        let key = key.to_string();

        match store.get(&key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => {
                    tracing::debug!(key = %key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache unavailable, treating as miss");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let key = key.to_string();

        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        if let Err(e) = store.set(&key, json, CACHE_TTL).await {
            tracing::warn!(key = %key, error = %e, "Cache write dropped");
        }
    }
}
