//! Recommendation engine
//!
//! Every operation follows the same flow:
//! 1. Validate the request and render its cache key
//! 2. Cache hit: return immediately
//! 3. Miss: look up history; without it take the fallback tier, with it score
//!    the age-filtered catalog
//! 4. Write the result through to the cache and return it

use std::sync::Arc;

use crate::{
    cached,
    db::{CacheKey, RecommendationCache},
    error::{AppError, AppResult},
    models::{AgeGroup, CandidateFilter, CatalogEntry, CatalogKind, CharacterRole},
    services::{
        catalog::{CatalogFetcher, CatalogStore},
        history::{HistoryAggregator, HistoryStore},
        random::Shuffler,
        rules, scoring,
    },
};

pub const DEFAULT_UNIVERSE_LIMIT: usize = 5;
pub const DEFAULT_CHARACTER_LIMIT: usize = 5;
pub const DEFAULT_THEME_LIMIT: usize = 3;
pub const DEFAULT_MORAL_LESSON_LIMIT: usize = 3;

fn validate_limit(limit: usize) -> AppResult<()> {
    if limit == 0 {
        return Err(AppError::InvalidRequest(
            "limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniverseRequest {
    pub user_id: Option<String>,
    pub age_group: AgeGroup,
    pub limit: usize,
}

impl Default for UniverseRequest {
    fn default() -> Self {
        Self {
            user_id: None,
            age_group: AgeGroup::All,
            limit: DEFAULT_UNIVERSE_LIMIT,
        }
    }
}

impl UniverseRequest {
    fn cache_key(&self) -> CacheKey {
        CacheKey::Universes {
            user_id: self.user_id.clone(),
            age_group: self.age_group,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRequest {
    /// Required; blank is rejected
    pub universe_id: String,
    pub user_id: Option<String>,
    pub role: Option<CharacterRole>,
    pub limit: usize,
}

impl CharacterRequest {
    pub fn new(universe_id: impl Into<String>) -> Self {
        Self {
            universe_id: universe_id.into(),
            user_id: None,
            role: None,
            limit: DEFAULT_CHARACTER_LIMIT,
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.universe_id.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "universeId is required".to_string(),
            ));
        }
        validate_limit(self.limit)
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::Characters {
            universe_id: self.universe_id.clone(),
            user_id: self.user_id.clone(),
            role: self.role,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeRequest {
    pub user_id: Option<String>,
    pub age_group: AgeGroup,
    /// Only partitions the cache; the theme catalog is not universe-specific
    pub universe_ids: Vec<String>,
    pub limit: usize,
}

impl Default for ThemeRequest {
    fn default() -> Self {
        Self {
            user_id: None,
            age_group: AgeGroup::All,
            universe_ids: Vec::new(),
            limit: DEFAULT_THEME_LIMIT,
        }
    }
}

impl ThemeRequest {
    fn cache_key(&self) -> CacheKey {
        CacheKey::Themes {
            user_id: self.user_id.clone(),
            age_group: self.age_group,
            universe_ids: self.universe_ids.clone(),
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoralLessonRequest {
    pub user_id: Option<String>,
    pub age_group: AgeGroup,
    pub theme: Option<String>,
    pub limit: usize,
}

impl Default for MoralLessonRequest {
    fn default() -> Self {
        Self {
            user_id: None,
            age_group: AgeGroup::All,
            theme: None,
            limit: DEFAULT_MORAL_LESSON_LIMIT,
        }
    }
}

impl MoralLessonRequest {
    fn cache_key(&self) -> CacheKey {
        CacheKey::MoralLessons {
            user_id: self.user_id.clone(),
            age_group: self.age_group,
            theme: self.theme.clone(),
            limit: self.limit,
        }
    }
}

/// Caching and scoring engine behind the four recommendation operations.
///
/// Holds no mutable state of its own; all collaborators are injected and
/// shared, so one engine serves concurrent requests.
#[derive(Clone)]
pub struct RecommendationEngine {
    cache: RecommendationCache,
    history: HistoryAggregator,
    catalog: CatalogFetcher,
    shuffler: Arc<dyn Shuffler>,
}

impl RecommendationEngine {
    pub fn new(
        cache: RecommendationCache,
        history_store: Arc<dyn HistoryStore>,
        catalog_store: Arc<dyn CatalogStore>,
        shuffler: Arc<dyn Shuffler>,
    ) -> Self {
        Self {
            cache,
            history: HistoryAggregator::new(history_store),
            catalog: CatalogFetcher::new(catalog_store),
            shuffler,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn recommend_universes(
        &self,
        request: UniverseRequest,
    ) -> AppResult<Vec<CatalogEntry>> {
        validate_limit(request.limit)?;
        let key = request.cache_key();
        cached!(self.cache, key, self.compute_universes(&request))
    }

    #[tracing::instrument(skip(self))]
    pub async fn recommend_characters(
        &self,
        request: CharacterRequest,
    ) -> AppResult<Vec<CatalogEntry>> {
        request.validate()?;
        let key = request.cache_key();
        cached!(self.cache, key, self.compute_characters(&request))
    }

    #[tracing::instrument(skip(self))]
    pub async fn recommend_themes(&self, request: ThemeRequest) -> AppResult<Vec<CatalogEntry>> {
        validate_limit(request.limit)?;
        let key = request.cache_key();
        cached!(self.cache, key, self.compute_themes(&request))
    }

    #[tracing::instrument(skip(self))]
    pub async fn recommend_moral_lessons(
        &self,
        request: MoralLessonRequest,
    ) -> AppResult<Vec<CatalogEntry>> {
        validate_limit(request.limit)?;
        let key = request.cache_key();
        cached!(self.cache, key, self.compute_moral_lessons(&request))
    }

    async fn compute_universes(&self, request: &UniverseRequest) -> AppResult<Vec<CatalogEntry>> {
        let filter = CandidateFilter::for_age(request.age_group);
        let lookup = self.history.lookup(request.user_id.as_deref()).await;

        match lookup.into_history() {
            Some(history) => {
                let candidates = self
                    .catalog
                    .candidates(CatalogKind::Universe, &filter)
                    .await?;
                Ok(scoring::rank_blended(
                    candidates,
                    &history.universes,
                    request.limit,
                ))
            }
            None => {
                self.catalog
                    .popular(CatalogKind::Universe, &filter, request.limit)
                    .await
            }
        }
    }

    async fn compute_characters(
        &self,
        request: &CharacterRequest,
    ) -> AppResult<Vec<CatalogEntry>> {
        let filter = CandidateFilter::for_universe(request.universe_id.as_str(), request.role);
        let lookup = self.history.lookup(request.user_id.as_deref()).await;

        match lookup.into_history() {
            Some(history) => {
                let candidates = self
                    .catalog
                    .candidates(CatalogKind::Character, &filter)
                    .await?;
                Ok(scoring::rank_blended(
                    candidates,
                    &history.characters,
                    request.limit,
                ))
            }
            None => {
                self.catalog
                    .popular(CatalogKind::Character, &filter, request.limit)
                    .await
            }
        }
    }

    async fn compute_themes(&self, request: &ThemeRequest) -> AppResult<Vec<CatalogEntry>> {
        let filter = CandidateFilter::for_age(request.age_group);
        let lookup = self.history.lookup(request.user_id.as_deref()).await;
        let mut candidates = self.catalog.candidates(CatalogKind::Theme, &filter).await?;

        match lookup.into_history() {
            Some(history) => Ok(rules::rank_themes(
                candidates,
                &history.themes,
                request.limit,
            )),
            None => {
                self.shuffler.shuffle(&mut candidates);
                candidates.truncate(request.limit);
                Ok(candidates)
            }
        }
    }

    async fn compute_moral_lessons(
        &self,
        request: &MoralLessonRequest,
    ) -> AppResult<Vec<CatalogEntry>> {
        // Age narrowing comes from the rule tables, not from catalog ratings
        let catalog = self
            .catalog
            .candidates(CatalogKind::MoralLesson, &CandidateFilter::default())
            .await?;

        Ok(rules::select_moral_lessons(
            catalog,
            request.theme.as_deref(),
            request.age_group,
            request.limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryCache, InMemoryHistory};
    use crate::models::ActivityRecord;
    use crate::services::catalog::builtin::builtin_themes;
    use crate::services::catalog::StaticCatalog;
    use crate::services::random::SeededShuffler;
    use mockall::mock;

    mock! {
        Catalog {}
        #[async_trait::async_trait]
        impl CatalogStore for Catalog {
            async fn fetch_all(&self, kind: CatalogKind) -> AppResult<Vec<CatalogEntry>>;
            async fn fetch_matching(
                &self,
                kind: CatalogKind,
                filter: &CandidateFilter,
            ) -> AppResult<Vec<CatalogEntry>>;
            async fn fetch_popular(
                &self,
                kind: CatalogKind,
                filter: &CandidateFilter,
                limit: usize,
            ) -> AppResult<Vec<CatalogEntry>>;
            fn name(&self) -> &'static str;
        }
    }

    mock! {
        History {}
        #[async_trait::async_trait]
        impl HistoryStore for History {
            async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<ActivityRecord>>;
        }
    }

    fn universe(id: &str, rating: AgeGroup, popularity: f64) -> CatalogEntry {
        CatalogEntry::new(CatalogKind::Universe, id, id)
            .with_age_rating(rating)
            .with_popularity(popularity)
    }

    fn universes() -> Vec<CatalogEntry> {
        vec![
            universe("dragon-ball", AgeGroup::EarlyReader, 50.0),
            universe("toy-story", AgeGroup::All, 80.0),
            universe("lion-king", AgeGroup::Preschool, 70.0),
            universe("futurama", AgeGroup::MiddleGrade, 60.0),
        ]
    }

    fn ids(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    fn engine_with(
        cache: RecommendationCache,
        history: Arc<dyn HistoryStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> RecommendationEngine {
        RecommendationEngine::new(cache, history, catalog, Arc::new(SeededShuffler::new(7)))
    }

    fn static_engine(history: InMemoryHistory) -> RecommendationEngine {
        let catalog =
            StaticCatalog::builtin().with_entries(CatalogKind::Universe, universes());
        engine_with(
            RecommendationCache::disabled(),
            Arc::new(history),
            Arc::new(catalog),
        )
    }

    async fn history_of(records: Vec<ActivityRecord>) -> InMemoryHistory {
        let history = InMemoryHistory::new();
        for record in records {
            history.insert(record).await;
        }
        history
    }

    #[tokio::test]
    async fn test_user_without_records_takes_popularity_tier() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_popular()
            .times(1)
            .returning(|_, _, _| Ok(vec![universe("toy-story", AgeGroup::All, 80.0)]));
        catalog.expect_fetch_all().times(0);
        catalog.expect_fetch_matching().times(0);
        catalog.expect_name().return_const("mock");

        let engine = engine_with(
            RecommendationCache::disabled(),
            Arc::new(InMemoryHistory::new()),
            Arc::new(catalog),
        );

        let result = engine
            .recommend_universes(UniverseRequest {
                user_id: Some("alice".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&result), vec!["toy-story"]);
    }

    #[tokio::test]
    async fn test_history_outranks_popularity() {
        let history = history_of(vec![
            ActivityRecord::new("alice", ["dragon-ball"], None),
            ActivityRecord::new("alice", ["dragon-ball"], None),
            ActivityRecord::new("alice", ["dragon-ball"], None),
        ])
        .await;
        let engine = static_engine(history);

        let result = engine
            .recommend_universes(UniverseRequest {
                user_id: Some("alice".to_string()),
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&result), vec!["dragon-ball", "toy-story"]);
    }

    #[tokio::test]
    async fn test_age_filter_applies_on_both_tiers() {
        let history = history_of(vec![ActivityRecord::new("alice", ["futurama"], None)]).await;
        let engine = static_engine(history);

        for user_id in [None, Some("alice".to_string())] {
            let result = engine
                .recommend_universes(UniverseRequest {
                    user_id,
                    age_group: AgeGroup::Preschool,
                    limit: 10,
                })
                .await
                .unwrap();
            assert!(result
                .iter()
                .all(|u| matches!(u.age_rating, AgeGroup::Preschool | AgeGroup::All)));
            assert_eq!(ids(&result), vec!["toy-story", "lion-king"]);
        }
    }

    #[tokio::test]
    async fn test_history_store_failure_degrades_to_popularity() {
        let mut history = MockHistory::new();
        history
            .expect_find_by_user()
            .returning(|_| Err(AppError::Internal("connection refused".to_string())));
        let catalog =
            StaticCatalog::empty().with_entries(CatalogKind::Universe, universes());
        let engine = engine_with(
            RecommendationCache::disabled(),
            Arc::new(history),
            Arc::new(catalog),
        );

        let result = engine
            .recommend_universes(UniverseRequest {
                user_id: Some("alice".to_string()),
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&result), vec!["toy-story", "lion-king"]);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_surfaced() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_popular()
            .returning(|_, _, _| Err(AppError::Internal("timeout".to_string())));
        catalog.expect_name().return_const("mock");
        let engine = engine_with(
            RecommendationCache::disabled(),
            Arc::new(InMemoryHistory::new()),
            Arc::new(catalog),
        );

        let err = engine
            .recommend_universes(UniverseRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_the_catalog() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_popular()
            .times(1)
            .returning(|_, _, _| Ok(vec![universe("toy-story", AgeGroup::All, 80.0)]));
        catalog.expect_name().return_const("mock");
        let store = Arc::new(InMemoryCache::new());
        let engine = engine_with(
            RecommendationCache::new(store.clone()),
            Arc::new(InMemoryHistory::new()),
            Arc::new(catalog),
        );

        let first = engine
            .recommend_universes(UniverseRequest::default())
            .await
            .unwrap();
        let second = engine
            .recommend_universes(UniverseRequest::default())
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_recomputes() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_popular()
            .times(2)
            .returning(|_, _, _| Ok(vec![]));
        catalog.expect_name().return_const("mock");
        let engine = engine_with(
            RecommendationCache::disabled(),
            Arc::new(InMemoryHistory::new()),
            Arc::new(catalog),
        );

        for _ in 0..2 {
            engine
                .recommend_universes(UniverseRequest::default())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected_before_any_lookup() {
        // No expectations: any store call would panic
        let engine = engine_with(
            RecommendationCache::disabled(),
            Arc::new(MockHistory::new()),
            Arc::new(MockCatalog::new()),
        );

        let err = engine
            .recommend_universes(UniverseRequest {
                limit: 0,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));

        let err = engine
            .recommend_moral_lessons(MoralLessonRequest {
                limit: 0,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_characters_require_a_universe() {
        let engine = static_engine(InMemoryHistory::new());
        let err = engine
            .recommend_characters(CharacterRequest::new("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_characters_popularity_tier_with_role() {
        let engine = static_engine(InMemoryHistory::new());
        let request = CharacterRequest {
            role: Some(CharacterRole::Hero),
            ..CharacterRequest::new("toy-story")
        };

        let result = engine.recommend_characters(request).await.unwrap();
        assert_eq!(ids(&result), vec!["woody", "buzz", "jessie"]);
    }

    #[tokio::test]
    async fn test_characters_personalized_by_history() {
        let history = history_of(vec![
            ActivityRecord::new("bob", ["dragon-ball"], None).with_characters(["krillin"]),
            ActivityRecord::new("bob", ["dragon-ball"], None).with_characters(["krillin"]),
        ])
        .await;
        let engine = static_engine(history);
        let request = CharacterRequest {
            user_id: Some("bob".to_string()),
            limit: 3,
            ..CharacterRequest::new("dragon-ball")
        };

        let result = engine.recommend_characters(request).await.unwrap();
        assert_eq!(ids(&result), vec!["krillin", "goku", "vegeta"]);
    }

    #[tokio::test]
    async fn test_themes_without_history_use_the_shuffler() {
        let engine = static_engine(InMemoryHistory::new());

        let result = engine
            .recommend_themes(ThemeRequest::default())
            .await
            .unwrap();

        let mut expected = builtin_themes();
        SeededShuffler::new(7).shuffle(&mut expected);
        expected.truncate(DEFAULT_THEME_LIMIT);
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_themes_with_history_rank_by_theme_count() {
        let history = history_of(vec![
            ActivityRecord::new("carol", ["toy-story"], Some("mystery_solving")),
            ActivityRecord::new("carol", ["toy-story"], Some("mystery_solving")),
            ActivityRecord::new("carol", ["toy-story"], Some("helping_others")),
        ])
        .await;
        let engine = static_engine(history);

        let result = engine
            .recommend_themes(ThemeRequest {
                user_id: Some("carol".to_string()),
                universe_ids: vec!["toy-story".to_string()],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            ids(&result),
            vec!["mystery_solving", "helping_others", "adventure_quest"]
        );
    }

    #[tokio::test]
    async fn test_moral_lessons_intersect_theme_and_age() {
        let engine = static_engine(InMemoryHistory::new());

        let result = engine
            .recommend_moral_lessons(MoralLessonRequest {
                age_group: AgeGroup::Preschool,
                theme: Some("adventure_quest".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&result), vec!["friendship_teamwork"]);
    }
}
