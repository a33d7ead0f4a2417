//! Score blending and ranking.
//!
//! All rankings here use a stable sort, so candidates with equal scores keep
//! their catalog order and the output is a pure function of the inputs.

use crate::models::{CatalogEntry, FrequencyTable};

pub const POPULARITY_WEIGHT: f64 = 0.1;
/// One personal interaction outweighs a hundred points of popularity
pub const HISTORY_WEIGHT: f64 = 10.0;

/// A candidate and its score, only alive while ranking
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub entry: CatalogEntry,
    pub score: f64,
}

/// `POPULARITY_WEIGHT * popularity + HISTORY_WEIGHT * frequency[id]`
pub fn blended_score(entry: &CatalogEntry, frequency: &FrequencyTable) -> f64 {
    POPULARITY_WEIGHT * entry.popularity + HISTORY_WEIGHT * f64::from(frequency.count(&entry.id))
}

/// History-only score used by the theme rules
pub fn history_score(entry: &CatalogEntry, frequency: &FrequencyTable) -> f64 {
    HISTORY_WEIGHT * f64::from(frequency.count(&entry.id))
}

/// Scores every candidate, sorts descending (ties keep input order), truncates
pub fn rank<F>(candidates: Vec<CatalogEntry>, score: F, limit: usize) -> Vec<CatalogEntry>
where
    F: Fn(&CatalogEntry) -> f64,
{
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|entry| {
            let score = score(&entry);
            ScoredCandidate { entry, score }
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);

    scored.into_iter().map(|candidate| candidate.entry).collect()
}

/// Personalized tier: popularity blended with the user's frequency table
pub fn rank_blended(
    candidates: Vec<CatalogEntry>,
    frequency: &FrequencyTable,
    limit: usize,
) -> Vec<CatalogEntry> {
    rank(candidates, |entry| blended_score(entry, frequency), limit)
}

/// Popularity-only tier
pub fn rank_by_popularity(candidates: Vec<CatalogEntry>, limit: usize) -> Vec<CatalogEntry> {
    rank(candidates, |entry| entry.popularity, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogKind;

    fn universe(id: &str, popularity: f64) -> CatalogEntry {
        CatalogEntry::new(CatalogKind::Universe, id, id).with_popularity(popularity)
    }

    fn ids(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_history_beats_raw_popularity() {
        let frequency: FrequencyTable = ["dragon-ball"; 3].into_iter().collect();
        let dragon_ball = universe("dragon-ball", 50.0);
        let toy_story = universe("toy-story", 80.0);

        assert_eq!(blended_score(&dragon_ball, &frequency), 35.0);
        assert_eq!(blended_score(&toy_story, &frequency), 8.0);

        let ranked = rank_blended(vec![dragon_ball, toy_story], &frequency, 5);
        assert_eq!(ids(&ranked), vec!["dragon-ball", "toy-story"]);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let frequency = FrequencyTable::new();
        let candidates = vec![
            universe("first", 40.0),
            universe("second", 40.0),
            universe("third", 40.0),
        ];

        for _ in 0..3 {
            let ranked = rank_blended(candidates.clone(), &frequency, 3);
            assert_eq!(ids(&ranked), vec!["first", "second", "third"]);
        }
    }

    #[test]
    fn test_ties_with_equal_history_keep_catalog_order() {
        let frequency: FrequencyTable = ["b", "a"].into_iter().collect();
        let ranked = rank_blended(vec![universe("b", 10.0), universe("a", 10.0)], &frequency, 2);
        assert_eq!(ids(&ranked), vec!["b", "a"]);
    }

    #[test]
    fn test_rank_truncates_to_limit() {
        let candidates = (0..10).map(|i| universe(&format!("u{}", i), i as f64)).collect();
        let ranked = rank_by_popularity(candidates, 3);
        assert_eq!(ids(&ranked), vec!["u9", "u8", "u7"]);
    }

    #[test]
    fn test_rank_with_limit_above_pool_returns_everything() {
        let ranked = rank_by_popularity(vec![universe("only", 1.0)], 5);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_history_score_ignores_popularity() {
        let frequency: FrequencyTable = ["friendship_tale"].into_iter().collect();
        let theme = CatalogEntry::new(CatalogKind::Theme, "friendship_tale", "Friendship Tale")
            .with_popularity(99.0);
        assert_eq!(history_score(&theme, &frequency), 10.0);
    }
}
