//! The resident-page table and its eviction rule.

use std::collections::HashMap;

use crate::buffer::replacer::Replacer;
use crate::common::{Error, PageId, Result, TransactionId};
use crate::storage::PageRef;

/// Bounded map from page id to cached page.
///
/// Not synchronized itself; the pool keeps it behind a single `Mutex` so
/// that check-capacity → evict → load → insert happens atomically.
pub(crate) struct PageTable {
    pages: HashMap<PageId, PageRef>,
    replacer: Box<dyn Replacer>,
    capacity: usize,
}

impl PageTable {
    pub(crate) fn new(capacity: usize, replacer: Box<dyn Replacer>) -> Self {
        Self {
            pages: HashMap::with_capacity(capacity),
            replacer,
            capacity,
        }
    }

    /// Look up a resident page, counting it as an access.
    pub(crate) fn get(&mut self, pid: PageId) -> Option<PageRef> {
        let page = self.pages.get(&pid).cloned()?;
        self.replacer.record_access(pid);
        Some(page)
    }

    /// Look up a resident page without touching the replacer.
    pub(crate) fn peek(&self, pid: PageId) -> Option<&PageRef> {
        self.pages.get(&pid)
    }

    pub(crate) fn contains(&self, pid: PageId) -> bool {
        self.pages.contains_key(&pid)
    }

    pub(crate) fn len(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.pages.len() >= self.capacity
    }

    /// Insert or replace. Returns the page previously cached under `pid`.
    pub(crate) fn insert(&mut self, pid: PageId, page: PageRef) -> Option<PageRef> {
        self.replacer.record_access(pid);
        self.pages.insert(pid, page)
    }

    pub(crate) fn remove(&mut self, pid: PageId) -> Option<PageRef> {
        let page = self.pages.remove(&pid)?;
        self.replacer.remove(pid);
        Some(page)
    }

    /// Every resident page id, in ascending order.
    pub(crate) fn page_ids(&self) -> Vec<PageId> {
        let mut ids: Vec<PageId> = self.pages.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Resident pages whose dirty owner is `tid`, in ascending order.
    pub(crate) fn dirtied_by(&self, tid: TransactionId) -> Vec<PageId> {
        let mut ids: Vec<PageId> = self
            .pages
            .iter()
            .filter(|(_, page)| page.read().is_dirty() == Some(tid))
            .map(|(&pid, _)| pid)
            .collect();
        ids.sort();
        ids
    }

    /// Remove and return a page that can be dropped without write-back.
    ///
    /// The replacer picks among unlocked pages; if its choice is dirty it
    /// picks again among the unlocked clean ones. Dirty pages always belong
    /// to an uncommitted transaction, so they are never evicted.
    ///
    /// # Errors
    /// `Error::CacheExhausted` if every resident page is locked or dirty.
    pub(crate) fn evict(&mut self, is_locked: impl Fn(PageId) -> bool) -> Result<PageId> {
        let unlocked: Vec<PageId> = self
            .page_ids()
            .into_iter()
            .filter(|&pid| !is_locked(pid))
            .collect();

        let first = self.replacer.pick(&unlocked);
        let victim = match first {
            Some(pid) if self.is_clean(pid) => Some(pid),
            Some(_) => {
                let clean: Vec<PageId> = unlocked
                    .into_iter()
                    .filter(|&pid| self.is_clean(pid))
                    .collect();
                self.replacer.pick(&clean)
            }
            None => None,
        };

        let victim = victim.ok_or(Error::CacheExhausted {
            resident: self.pages.len(),
        })?;
        self.remove(victim);
        Ok(victim)
    }

    fn is_clean(&self, pid: PageId) -> bool {
        self.pages
            .get(&pid)
            .is_some_and(|page| page.read().is_dirty().is_none())
    }
}
