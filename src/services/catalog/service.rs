//! Upstream service catalog
//!
//! Universes come from the universe management service, characters from the
//! character database service when one is configured. Themes and moral
//! lessons are fixed tables served from [`StaticCatalog`].
//!
//! API Flow:
//! 1. All universes: GET {universe_url}/api/universes
//! 2. Popular universes: GET {universe_url}/api/universes/popular?limit=N
//! 3. Characters: GET {character_url}/api/characters?universe=ID&type=ROLE
//!    (answers `{status, results, data: {characters}}`, universe populated)

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{
        CandidateFilter, CatalogEntry, CatalogKind, CharacterDocument, CharacterListResponse,
        UniverseDocument,
    },
    services::catalog::{rank_popular, CatalogStore, StaticCatalog},
};

#[derive(Clone)]
pub struct ServiceCatalog {
    http_client: HttpClient,
    universe_url: String,
    character_url: Option<String>,
    builtin: StaticCatalog,
}

impl ServiceCatalog {
    pub fn new(universe_url: String, character_url: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            universe_url: universe_url.trim_end_matches('/').to_string(),
            character_url: character_url.map(|url| url.trim_end_matches('/').to_string()),
            builtin: StaticCatalog::builtin(),
        }
    }

    /// GETs and decodes a JSON body from an upstream service
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        tracing::debug!(url = %url, "Fetching catalog from upstream service");

        let response = self.http_client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                url = %url,
                status = %status,
                body = %body,
                "Catalog service request failed"
            );
            return Err(AppError::UpstreamUnavailable(format!(
                "Catalog service returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_universes(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<Vec<CatalogEntry>> {
        let url = format!("{}{}", self.universe_url, path);
        let documents: Vec<UniverseDocument> = self.get_json(&url, query).await?;
        Ok(convert_documents(CatalogKind::Universe, documents))
    }

    async fn fetch_characters(&self, filter: &CandidateFilter) -> AppResult<Vec<CatalogEntry>> {
        let Some(base_url) = &self.character_url else {
            return self.builtin.fetch_matching(CatalogKind::Character, filter).await;
        };

        let url = format!("{}/api/characters", base_url);
        let response: CharacterListResponse =
            self.get_json(&url, &character_query(filter)).await?;
        Ok(convert_raw_characters(response.data.characters))
    }
}

/// Server-side narrowing supported by the character service
fn character_query(filter: &CandidateFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(universe_id) = &filter.universe_id {
        query.push(("universe", universe_id.clone()));
    }
    if let Some(role) = filter.role {
        query.push(("type", role.to_string()));
    }
    query
}

/// Decodes characters one by one, skipping the ones that do not parse
fn convert_raw_characters(raw: Vec<serde_json::Value>) -> Vec<CatalogEntry> {
    let documents = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<CharacterDocument>(value) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable character document");
                None
            }
        })
        .collect();
    convert_documents(CatalogKind::Character, documents)
}

/// Converts upstream documents, skipping the ones that do not map onto the catalog model
fn convert_documents<D>(kind: CatalogKind, documents: Vec<D>) -> Vec<CatalogEntry>
where
    CatalogEntry: TryFrom<D, Error = AppError>,
{
    documents
        .into_iter()
        .filter_map(|doc| match CatalogEntry::try_from(doc) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Skipping malformed catalog document");
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl CatalogStore for ServiceCatalog {
    async fn fetch_all(&self, kind: CatalogKind) -> AppResult<Vec<CatalogEntry>> {
        match kind {
            CatalogKind::Universe => self.fetch_universes("/api/universes", &[]).await,
            CatalogKind::Character => self.fetch_characters(&CandidateFilter::default()).await,
            CatalogKind::Theme | CatalogKind::MoralLesson => self.builtin.fetch_all(kind).await,
        }
    }

    async fn fetch_matching(
        &self,
        kind: CatalogKind,
        filter: &CandidateFilter,
    ) -> AppResult<Vec<CatalogEntry>> {
        let mut entries = match kind {
            CatalogKind::Character => self.fetch_characters(filter).await?,
            _ => self.fetch_all(kind).await?,
        };
        entries.retain(|e| filter.matches(e));
        Ok(entries)
    }

    async fn fetch_popular(
        &self,
        kind: CatalogKind,
        filter: &CandidateFilter,
        limit: usize,
    ) -> AppResult<Vec<CatalogEntry>> {
        // The popularity endpoint knows nothing about age ratings
        if kind == CatalogKind::Universe && filter.is_unrestricted() {
            return self
                .fetch_universes("/api/universes/popular", &[("limit", limit.to_string())])
                .await;
        }

        let entries = self.fetch_matching(kind, filter).await?;
        Ok(rank_popular(entries, filter, limit))
    }

    fn name(&self) -> &'static str {
        "storyverse-services"
    }
}
