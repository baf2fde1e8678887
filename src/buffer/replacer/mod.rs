//! Eviction policy implementations (replacers).
//!
//! A [`Replacer`] only ranks pages. The buffer pool decides which pages
//! are *eligible* (resident, unlocked, clean) and asks the replacer to
//! pick among them, so no policy can ever choose a locked page.
//!
//! Currently implements:
//! - [`RandomReplacer`] - Uniform random choice (the default)
//! - [`FifoReplacer`] - Oldest-loaded first

mod fifo;
mod random;

pub use fifo::FifoReplacer;
pub use random::RandomReplacer;

use crate::common::PageId;

/// Ranks resident pages for eviction.
pub trait Replacer: Send {
    /// A page was loaded or touched.
    fn record_access(&mut self, page_id: PageId);

    /// A page left the pool.
    fn remove(&mut self, page_id: PageId);

    /// Choose one of `candidates`, or `None` if the slice is empty.
    fn pick(&mut self, candidates: &[PageId]) -> Option<PageId>;
}

/// Which [`Replacer`] a pool is built with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    #[default]
    Random,
    Fifo,
}

impl EvictionPolicy {
    /// Build the replacer. `seed` only affects [`EvictionPolicy::Random`].
    pub fn build(self, seed: Option<u64>) -> Box<dyn Replacer> {
        match self {
            EvictionPolicy::Random => Box::new(match seed {
                Some(seed) => RandomReplacer::with_seed(seed),
                None => RandomReplacer::new(),
            }),
            EvictionPolicy::Fifo => Box::new(FifoReplacer::new()),
        }
    }
}
