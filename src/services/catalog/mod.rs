//! Catalog sources
//!
//! The engine reads candidate pools through [`CatalogStore`]. Two sources ship
//! with the crate: the built-in tables (themes, moral lessons and a starter
//! character set) and the upstream universe/character services over HTTP.

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{CandidateFilter, CatalogEntry, CatalogKind},
    services::scoring,
};

pub mod builtin;
pub mod service;

pub use builtin::StaticCatalog;
pub use service::ServiceCatalog;

/// Read-only access to the recommendation catalogs
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every entry of one kind, in catalog order
    async fn fetch_all(&self, kind: CatalogKind) -> AppResult<Vec<CatalogEntry>>;

    /// Entries of one kind matching `filter`, in catalog order
    ///
    /// Sources that can filter server-side override it to avoid pulling
    /// the whole catalog.
    async fn fetch_matching(
        &self,
        kind: CatalogKind,
        filter: &CandidateFilter,
    ) -> AppResult<Vec<CatalogEntry>> {
        let mut entries = self.fetch_all(kind).await?;
        entries.retain(|e| filter.matches(e));
        Ok(entries)
    }

    /// Top entries by raw popularity among those matching `filter`
    ///
    /// Default implementation ranks what `fetch_matching` returns. Sources
    /// with a native popularity endpoint override it.
    async fn fetch_popular(
        &self,
        kind: CatalogKind,
        filter: &CandidateFilter,
        limit: usize,
    ) -> AppResult<Vec<CatalogEntry>> {
        let entries = self.fetch_matching(kind, filter).await?;
        Ok(rank_popular(entries, filter, limit))
    }

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Filters, then orders by popularity (stable), then truncates
pub fn rank_popular(
    entries: Vec<CatalogEntry>,
    filter: &CandidateFilter,
    limit: usize,
) -> Vec<CatalogEntry> {
    let candidates = entries.into_iter().filter(|e| filter.matches(e)).collect();
    scoring::rank_by_popularity(candidates, limit)
}

/// Fetches candidate pools and applies the candidate filter.
///
/// Any store failure becomes [`AppError::UpstreamUnavailable`]: there is no
/// recommendation without a catalog.
#[derive(Clone)]
pub struct CatalogFetcher {
    store: Arc<dyn CatalogStore>,
}

impl CatalogFetcher {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Full candidate pool of `kind`, restricted by `filter`, in catalog order
    pub async fn candidates(
        &self,
        kind: CatalogKind,
        filter: &CandidateFilter,
    ) -> AppResult<Vec<CatalogEntry>> {
        let entries = self
            .store
            .fetch_matching(kind, filter)
            .await
            .map_err(|e| self.upstream(kind, e))?;

        let total = entries.len();
        let candidates: Vec<CatalogEntry> = entries
            .into_iter()
            .filter(|e| e.kind == kind && filter.matches(e))
            .collect();

        tracing::debug!(
            kind = %kind,
            total,
            candidates = candidates.len(),
            "Fetched candidate pool"
        );

        Ok(candidates)
    }

    /// Popularity tier: top `limit` entries by raw popularity
    pub async fn popular(
        &self,
        kind: CatalogKind,
        filter: &CandidateFilter,
        limit: usize,
    ) -> AppResult<Vec<CatalogEntry>> {
        let entries = self
            .store
            .fetch_popular(kind, filter, limit)
            .await
            .map_err(|e| self.upstream(kind, e))?;

        // Sources with a native popularity endpoint may ignore parts of the filter
        let mut popular: Vec<CatalogEntry> = entries
            .into_iter()
            .filter(|e| e.kind == kind && filter.matches(e))
            .collect();
        popular.truncate(limit);

        Ok(popular)
    }

    fn upstream(&self, kind: CatalogKind, error: AppError) -> AppError {
        tracing::error!(
            kind = %kind,
            source = self.store.name(),
            error = %error,
            "Catalog fetch failed"
        );
        AppError::UpstreamUnavailable(format!("{} catalog unavailable: {}", kind, error))
    }
}
