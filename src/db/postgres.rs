use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::time::Duration;

use crate::{error::AppResult, models::ActivityRecord, services::history::HistoryStore};

/// Creates a PostgreSQL connection pool
///
/// The pool connects lazily, so the service starts (and serves the
/// popularity tier) while the database is still unreachable.
pub fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_lazy(database_url)?;

    Ok(pool)
}

/// Row of the `stories` table as read for recommendations
#[derive(Debug, FromRow)]
struct StoryRow {
    user_id: String,
    universe_ids: Vec<String>,
    character_ids: Vec<String>,
    theme: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<StoryRow> for ActivityRecord {
    fn from(row: StoryRow) -> Self {
        ActivityRecord {
            user_id: row.user_id,
            universe_ids: row.universe_ids.into_iter().collect(),
            character_ids: row.character_ids.into_iter().collect(),
            theme: row.theme,
            timestamp: row.created_at,
        }
    }
}

/// Story history backed by Postgres
#[derive(Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl HistoryStore for PgHistoryStore {
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<ActivityRecord>> {
        let rows: Vec<StoryRow> = sqlx::query_as(
            r#"
            SELECT user_id,
                   COALESCE(universe_ids, '{}') AS universe_ids,
                   COALESCE(character_ids, '{}') AS character_ids,
                   theme,
                   created_at
            FROM stories
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, records = rows.len(), "Loaded story history");

        Ok(rows.into_iter().map(ActivityRecord::from).collect())
    }
}
