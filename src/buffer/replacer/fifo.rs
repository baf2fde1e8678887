//! FIFO (First-In-First-Out) replacement policy.
//!
//! Evicts the page that has been resident the longest among the
//! eligible candidates.

use std::collections::{HashSet, VecDeque};

use super::Replacer;
use crate::common::PageId;

/// Evicts pages in the order they entered the pool.
///
/// Re-accessing a page does not move it.
pub struct FifoReplacer {
    /// Page IDs in load order (front = oldest).
    queue: VecDeque<PageId>,

    /// Set for O(1) membership check.
    in_queue: HashSet<PageId>,
}

impl FifoReplacer {
    /// Create a new FIFO replacer.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            in_queue: HashSet::new(),
        }
    }

    /// Number of tracked pages.
    pub fn size(&self) -> usize {
        self.in_queue.len()
    }
}

impl Default for FifoReplacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Replacer for FifoReplacer {
    fn record_access(&mut self, page_id: PageId) {
        if self.in_queue.insert(page_id) {
            self.queue.push_back(page_id);
        }
    }

    fn remove(&mut self, page_id: PageId) {
        if self.in_queue.remove(&page_id) {
            self.queue.retain(|&pid| pid != page_id);
        }
    }

    /// Oldest tracked page that is also a candidate. Candidates the
    /// replacer has never seen come last, in slice order.
    fn pick(&mut self, candidates: &[PageId]) -> Option<PageId> {
        let eligible: HashSet<PageId> = candidates.iter().copied().collect();
        self.queue
            .iter()
            .copied()
            .find(|pid| eligible.contains(pid))
            .or_else(|| {
                candidates
                    .iter()
                    .copied()
                    .find(|pid| !self.in_queue.contains(pid))
            })
    }
}
