use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::sync::Mutex;

use crate::models::CatalogEntry;

/// Source of the shuffle used by the no-history theme tier
pub trait Shuffler: Send + Sync {
    fn shuffle(&self, entries: &mut [CatalogEntry]);
}

/// Shuffles with the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngShuffler;

impl Shuffler for ThreadRngShuffler {
    fn shuffle(&self, entries: &mut [CatalogEntry]) {
        entries.shuffle(&mut rand::thread_rng());
    }
}

/// Reproducible shuffles from a fixed seed
#[derive(Debug)]
pub struct SeededShuffler {
    rng: Mutex<StdRng>,
}

impl SeededShuffler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Shuffler for SeededShuffler {
    fn shuffle(&self, entries: &mut [CatalogEntry]) {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.shuffle(&mut *rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::builtin::builtin_themes;

    fn shuffled_ids(shuffler: &dyn Shuffler) -> Vec<String> {
        let mut themes = builtin_themes();
        shuffler.shuffle(&mut themes);
        themes.into_iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_same_seed_same_order() {
        let first = shuffled_ids(&SeededShuffler::new(42));
        let second = shuffled_ids(&SeededShuffler::new(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut shuffled = shuffled_ids(&ThreadRngShuffler);
        let mut original: Vec<String> = builtin_themes().into_iter().map(|t| t.id).collect();
        shuffled.sort();
        original.sort();
        assert_eq!(shuffled, original);
    }
}
