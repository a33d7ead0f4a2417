pub mod catalog;
pub mod history;
pub mod random;
pub mod recommendations;
pub mod rules;
pub mod scoring;

pub use catalog::{CatalogFetcher, CatalogStore, ServiceCatalog, StaticCatalog};
pub use history::{HistoryAggregator, HistoryLookup, HistoryStore, UserHistory};
pub use random::{SeededShuffler, Shuffler, ThreadRngShuffler};
pub use recommendations::{
    CharacterRequest, MoralLessonRequest, RecommendationEngine, ThemeRequest, UniverseRequest,
};
