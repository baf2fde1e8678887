//! Buffer Pool Manager - the page cache and transaction coordinator.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between table files and memory
//! - Page locking (strict 2PL) on every fetch
//! - Dirty tracking per owning transaction
//! - Force-at-commit / discard-at-abort transaction completion
//! - Pluggable eviction policies that never evict locked or dirty pages

use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::buffer::page_table::PageTable;
use crate::buffer::BufferPoolStats;
use crate::common::{BufferPoolConfig, Error, PageId, Result, TableId, TransactionId};
use crate::concurrency::{LockManager, Permission, Transaction};
use crate::storage::{Catalog, DbFile, Page, PageRef, Tuple};

/// Caches pages for concurrent transactions and enforces page locking.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                        │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ lock_manager │  │      page_table: Mutex<PageTable> │   │
/// │  │ PageId ⇄ Txn │  │  PageId → Arc<RwLock<Page>>       │   │
/// │  └──────────────┘  │  + replacer (Random | FIFO)       │   │
/// │                    └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐                        │
/// │  │   catalog    │  │    stats     │                        │
/// │  │TableId→DbFile│  │   atomics    │                        │
/// │  └──────────────┘  └──────────────┘                        │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `page_table`: `Mutex`, one critical section from lookup to insert
/// - `lock_manager`: its own `Mutex` + `Condvar`; the only place a caller
///   can block
/// - `stats`: no lock, all atomic counters
///
/// The page table is always taken before the lock table, never the other
/// way round. Don't hold a page guard across a call back into the pool.
///
/// # Steal policy
/// NO-STEAL: dirty pages are never evicted, so discarding them on abort
/// fully undoes a transaction. When nothing clean and unlocked is left,
/// fetches fail with `Error::CacheExhausted`.
///
/// # Usage
/// ```ignore
/// let pool = BufferPoolManager::new(BufferPoolConfig::new(64), catalog)?;
///
/// let tid = TransactionId::new();
/// let page = pool.get_page(tid, pid, Permission::Shared)?;
/// let first_byte = page.read().as_slice()[0];
///
/// pool.transaction_complete(tid, true)?;
/// ```
pub struct BufferPoolManager {
    config: BufferPoolConfig,

    /// Routes page ids to their table files.
    catalog: Arc<dyn Catalog>,

    /// Resident pages plus the replacement policy.
    page_table: Mutex<PageTable>,

    /// Page-level shared/exclusive locks.
    lock_manager: LockManager,

    /// Performance statistics.
    stats: BufferPoolStats,
}

impl BufferPoolManager {
    /// Create a new buffer pool.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if `config` doesn't validate.
    pub fn new(config: BufferPoolConfig, catalog: Arc<dyn Catalog>) -> Result<Self> {
        config.validate()?;

        let replacer = config.eviction.build(config.eviction_seed);

        Ok(Self {
            page_table: Mutex::new(PageTable::new(config.pool_size, replacer)),
            lock_manager: LockManager::new(config.lock_wait, config.lock_retries),
            catalog,
            stats: BufferPoolStats::new(),
            config,
        })
    }

    /// Start a transaction bound to this pool.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction::begin(self)
    }

    // ========================================================================
    // Public API: Fetch pages and locks
    // ========================================================================

    /// Fetch a page on behalf of `tid` with the given permission.
    ///
    /// Acquires the page lock first (this is where the caller may block),
    /// then returns the cached page or loads it from its file, evicting
    /// another page if the pool is full.
    ///
    /// # Errors
    /// - `Error::Deadlock` if the lock could not be acquired in time
    /// - `Error::CacheExhausted` if the pool is full of locked or dirty pages
    /// - `Error::InvalidPageReference` if the table isn't in the catalog
    /// - `Error::PageNotFound`, `Error::CorruptPage`, `Error::Io` from the file
    /// - `Error::PageSizeMismatch` if the file returned a wrongly sized page
    pub fn get_page(&self, tid: TransactionId, pid: PageId, perm: Permission) -> Result<PageRef> {
        self.lock_manager.acquire(tid, pid, perm)?;

        let mut table = self.page_table.lock();

        if let Some(page) = table.get(pid) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            trace!(%tid, %pid, %perm, "cache hit");
            return Ok(page);
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let file = self.database_file(pid.table_id)?;
        if table.is_full() {
            self.evict_page(&mut table)?;
        }

        let page = file.read_page(pid)?;
        if page.id() != pid {
            return Err(Error::CorruptPage {
                pid,
                reason: format!("file returned {}", page.id()),
            });
        }
        self.check_page_size(&page)?;
        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

        let page = page.into_ref();
        table.insert(pid, Arc::clone(&page));
        debug!(%tid, %pid, %perm, resident = table.len(), "loaded page");

        Ok(page)
    }

    /// Release `tid`'s lock on `pid` before the transaction ends.
    ///
    /// This breaks strict 2PL; it exists for tests and for callers that
    /// know the page was only inspected.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        self.lock_manager.release(tid, pid);
    }

    /// Does `tid` hold any lock on `pid`?
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_manager.holds(tid, pid)
    }

    // ========================================================================
    // Public API: Tuple mutations
    // ========================================================================

    /// Insert `tuple` into `table_id` on behalf of `tid`.
    ///
    /// The table's file picks the page (fetching it through this pool) and
    /// reports every page it modified; those pages are marked dirty by
    /// `tid` and cached so later fetches see the change.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: TableId, tuple: &mut Tuple) -> Result<()> {
        let file = self.database_file(table_id)?;
        let dirtied = file.insert_tuple(self, tid, tuple)?;
        self.absorb(tid, dirtied)
    }

    /// Delete `tuple` on behalf of `tid`. The tuple's record id routes the
    /// request to the right file.
    ///
    /// # Errors
    /// `Error::MissingRecordId` if the tuple was never stored.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<()> {
        let rid = tuple.record_id.ok_or(Error::MissingRecordId)?;
        let file = self.database_file(rid.page_id.table_id)?;
        let dirtied = file.delete_tuple(self, tid, tuple)?;
        self.absorb(tid, dirtied)
    }

    // ========================================================================
    // Public API: Transaction completion
    // ========================================================================

    /// Commit (`commit == true`) or abort `tid`, then release all its locks.
    ///
    /// # Errors
    /// Only a commit can fail, with the error of the first page write that
    /// failed. The transaction keeps its locks in that case; abort it to
    /// drop the unwritten pages and release them.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> Result<()> {
        if commit {
            self.commit_transaction(tid)
        } else {
            self.abort_transaction(tid);
            Ok(())
        }
    }

    /// Force every page dirtied by `tid` to its file, then release its locks.
    pub fn commit_transaction(&self, tid: TransactionId) -> Result<()> {
        let flushed = self.flush_pages(tid)?;
        let released = self.lock_manager.release_all(tid);

        self.stats.commits.fetch_add(1, Ordering::Relaxed);
        debug!(%tid, flushed, released, "transaction committed");
        Ok(())
    }

    /// Drop every page dirtied by `tid` from the cache, then release its
    /// locks. The next fetch of those pages reloads the on-disk version.
    pub fn abort_transaction(&self, tid: TransactionId) {
        let discarded = {
            let mut table = self.page_table.lock();
            let owned = table.dirtied_by(tid);
            for &pid in &owned {
                table.remove(pid);
            }
            owned.len()
        };
        let released = self.lock_manager.release_all(tid);

        self.stats
            .pages_discarded
            .fetch_add(discarded as u64, Ordering::Relaxed);
        self.stats.aborts.fetch_add(1, Ordering::Relaxed);
        debug!(%tid, discarded, released, "transaction aborted");
    }

    // ========================================================================
    // Public API: Flush and discard
    // ========================================================================

    /// Write every page dirtied by `tid` and clear its dirty marker.
    /// Locks are left alone. Returns the number of pages written.
    pub fn flush_pages(&self, tid: TransactionId) -> Result<usize> {
        let table = self.page_table.lock();
        let owned = table.dirtied_by(tid);
        for &pid in &owned {
            self.flush_resident(&table, pid)?;
        }
        Ok(owned.len())
    }

    /// Write a specific page to its file if it is resident and dirty.
    pub fn flush_page(&self, pid: PageId) -> Result<()> {
        let table = self.page_table.lock();
        self.flush_resident(&table, pid)?;
        Ok(())
    }

    /// Write every dirty resident page.
    ///
    /// This writes uncommitted changes too, so an abort afterwards can no
    /// longer undo them. Meant for shutdown and tests.
    pub fn flush_all_pages(&self) -> Result<()> {
        let table = self.page_table.lock();
        for pid in table.page_ids() {
            self.flush_resident(&table, pid)?;
        }
        Ok(())
    }

    /// Drop a page from the cache without writing it.
    pub fn discard_page(&self, pid: PageId) {
        if self.page_table.lock().remove(pid).is_some() {
            self.stats.pages_discarded.fetch_add(1, Ordering::Relaxed);
            trace!(%pid, "discarded page");
        }
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    pub fn config(&self) -> &BufferPoolConfig {
        &self.config
    }

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    /// Maximum number of resident pages.
    pub fn pool_size(&self) -> usize {
        self.config.pool_size
    }

    /// Get the number of pages in the buffer pool.
    pub fn page_count(&self) -> usize {
        self.page_table.lock().len()
    }

    pub fn is_resident(&self, pid: PageId) -> bool {
        self.page_table.lock().contains(pid)
    }

    /// Resident pages currently dirtied by `tid`.
    pub fn dirty_pages(&self, tid: TransactionId) -> Vec<PageId> {
        self.page_table.lock().dirtied_by(tid)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Mark pages produced by a mutation as dirtied by `tid` and cache them.
    fn absorb(&self, tid: TransactionId, pages: Vec<PageRef>) -> Result<()> {
        let mut table = self.page_table.lock();

        for page in pages {
            let pid = {
                let mut guard = page.write();
                self.check_page_size(&guard)?;
                guard.mark_dirty(tid);
                guard.id()
            };

            if !table.contains(pid) && table.is_full() {
                self.evict_page(&mut table)?;
            }
            table.insert(pid, page);
            trace!(%tid, %pid, "absorbed dirty page");
        }

        Ok(())
    }

    /// Write one resident page if dirty. Returns whether it was written.
    fn flush_resident(&self, table: &PageTable, pid: PageId) -> Result<bool> {
        let Some(page) = table.peek(pid) else {
            return Ok(false);
        };

        let mut page = page.write();
        if page.is_dirty().is_none() {
            return Ok(false);
        }

        let file = self.database_file(pid.table_id)?;
        file.write_page(&page)?;
        page.clear_dirty();

        self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
        trace!(%pid, "flushed page");
        Ok(true)
    }

    fn evict_page(&self, table: &mut PageTable) -> Result<()> {
        match table.evict(|pid| self.lock_manager.is_locked(pid)) {
            Ok(victim) => {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(%victim, "evicted page");
                Ok(())
            }
            Err(err) => {
                warn!(resident = table.len(), "no evictable page");
                Err(err)
            }
        }
    }

    fn database_file(&self, table_id: TableId) -> Result<Arc<dyn DbFile>> {
        self.catalog
            .database_file(table_id)
            .ok_or(Error::InvalidPageReference(table_id))
    }

    fn check_page_size(&self, page: &Page) -> Result<()> {
        if page.len() != self.config.page_size {
            return Err(Error::PageSizeMismatch {
                pid: page.id(),
                expected: self.config.page_size,
                actual: page.len(),
            });
        }
        Ok(())
    }
}
