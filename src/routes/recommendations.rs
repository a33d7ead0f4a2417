use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{AgeGroup, CatalogEntry, CharacterRole},
    routes::AppState,
    services::recommendations::{
        CharacterRequest, MoralLessonRequest, ThemeRequest, UniverseRequest,
        DEFAULT_CHARACTER_LIMIT, DEFAULT_MORAL_LESSON_LIMIT, DEFAULT_THEME_LIMIT,
        DEFAULT_UNIVERSE_LIMIT,
    },
};

// Query values arrive as strings so that `?ageGroup=` reads as absent
// instead of failing to deserialize.

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_age_group(value: Option<String>) -> AppResult<AgeGroup> {
    match present(value) {
        Some(raw) => raw.parse(),
        None => Ok(AgeGroup::All),
    }
}

fn parse_role(value: Option<String>) -> AppResult<Option<CharacterRole>> {
    present(value).map(|raw| raw.parse()).transpose()
}

fn parse_limit(value: Option<String>, default: usize) -> AppResult<usize> {
    match present(value) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::InvalidRequest(format!("limit must be a positive integer, got '{}'", raw))
        }),
        None => Ok(default),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniverseQuery {
    user_id: Option<String>,
    age_group: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterQuery {
    universe_id: Option<String>,
    user_id: Option<String>,
    role: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoralLessonQuery {
    user_id: Option<String>,
    age_group: Option<String>,
    theme: Option<String>,
    limit: Option<String>,
}

/// Handler for universe recommendations
pub async fn universes(
    State(state): State<AppState>,
    Query(params): Query<UniverseQuery>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let request = UniverseRequest {
        user_id: present(params.user_id),
        age_group: parse_age_group(params.age_group)?,
        limit: parse_limit(params.limit, DEFAULT_UNIVERSE_LIMIT)?,
    };

    let universes = state.engine.recommend_universes(request).await?;
    Ok(Json(universes))
}

/// Handler for character recommendations; `universeId` is required
pub async fn characters(
    State(state): State<AppState>,
    Query(params): Query<CharacterQuery>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let universe_id = present(params.universe_id)
        .ok_or_else(|| AppError::InvalidRequest("universeId is required".to_string()))?;

    let request = CharacterRequest {
        universe_id,
        user_id: present(params.user_id),
        role: parse_role(params.role)?,
        limit: parse_limit(params.limit, DEFAULT_CHARACTER_LIMIT)?,
    };

    let characters = state.engine.recommend_characters(request).await?;
    Ok(Json(characters))
}

/// Handler for theme recommendations
///
/// `universeId` may repeat, so the query is read as raw pairs.
pub async fn themes(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let first = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };

    let request = ThemeRequest {
        user_id: present(first("userId")),
        age_group: parse_age_group(first("ageGroup"))?,
        universe_ids: pairs
            .iter()
            .filter(|(key, value)| key == "universeId" && !value.trim().is_empty())
            .map(|(_, value)| value.clone())
            .collect(),
        limit: parse_limit(first("limit"), DEFAULT_THEME_LIMIT)?,
    };

    let themes = state.engine.recommend_themes(request).await?;
    Ok(Json(themes))
}

/// Handler for moral lesson recommendations
pub async fn moral_lessons(
    State(state): State<AppState>,
    Query(params): Query<MoralLessonQuery>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let request = MoralLessonRequest {
        user_id: present(params.user_id),
        age_group: parse_age_group(params.age_group)?,
        theme: present(params.theme),
        limit: parse_limit(params.limit, DEFAULT_MORAL_LESSON_LIMIT)?,
    };

    let morals = state.engine.recommend_moral_lessons(request).await?;
    Ok(Json(morals))
}
