//! Uniform random replacement.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::Replacer;
use crate::common::PageId;

/// Picks a victim uniformly at random among the eligible pages.
///
/// Keeps no per-page state, so `record_access` and `remove` are no-ops.
pub struct RandomReplacer {
    rng: StdRng,
}

impl RandomReplacer {
    /// Seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic choice sequence, for reproducible tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomReplacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Replacer for RandomReplacer {
    fn record_access(&mut self, _page_id: PageId) {}

    fn remove(&mut self, _page_id: PageId) {}

    fn pick(&mut self, candidates: &[PageId]) -> Option<PageId> {
        candidates.choose(&mut self.rng).copied()
    }
}
