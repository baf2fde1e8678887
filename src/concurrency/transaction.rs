//! RAII handle for a transaction.
//!
//! A [`Transaction`] ties a [`TransactionId`] to the pool that serves it.
//! It ends with [`Transaction::commit`] or [`Transaction::abort`]; a
//! handle dropped without either is aborted so its locks never leak.

use tracing::warn;

use crate::buffer::BufferPoolManager;
use crate::common::{PageId, Result, TableId, TransactionId};
use crate::concurrency::Permission;
use crate::storage::{PageRef, Tuple};

/// A running transaction.
///
/// # Example
/// ```ignore
/// let txn = pool.begin();
/// let page = txn.get_page(pid, Permission::Exclusive)?;
/// page.write().as_mut_slice()[0] = 0xFF;
/// txn.commit()?;   // forces dirty pages, releases locks
/// ```
pub struct Transaction<'a> {
    /// Pool the transaction's pages and locks live in.
    pool: &'a BufferPoolManager,
    tid: TransactionId,
    /// Set once commit or abort has run.
    completed: bool,
}

impl<'a> Transaction<'a> {
    /// Start a transaction with a fresh id.
    ///
    /// Called by `BufferPoolManager::begin()`.
    pub(crate) fn begin(pool: &'a BufferPoolManager) -> Self {
        Self {
            pool,
            tid: TransactionId::new(),
            completed: false,
        }
    }

    #[inline]
    pub fn id(&self) -> TransactionId {
        self.tid
    }

    /// See [`BufferPoolManager::get_page`].
    pub fn get_page(&self, pid: PageId, perm: Permission) -> Result<PageRef> {
        self.pool.get_page(self.tid, pid, perm)
    }

    pub fn insert_tuple(&self, table_id: TableId, tuple: &mut Tuple) -> Result<()> {
        self.pool.insert_tuple(self.tid, table_id, tuple)
    }

    pub fn delete_tuple(&self, tuple: &Tuple) -> Result<()> {
        self.pool.delete_tuple(self.tid, tuple)
    }

    pub fn holds_lock(&self, pid: PageId) -> bool {
        self.pool.holds_lock(self.tid, pid)
    }

    /// Force dirty pages to disk and release every lock.
    ///
    /// If a write fails the handle is dropped unfinished, which aborts the
    /// transaction, and the write error is returned.
    pub fn commit(mut self) -> Result<()> {
        self.pool.commit_transaction(self.tid)?;
        self.completed = true;
        Ok(())
    }

    /// Discard dirty pages and release every lock.
    pub fn abort(mut self) {
        self.pool.abort_transaction(self.tid);
        self.completed = true;
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.completed {
            warn!(tid = %self.tid, "transaction dropped without commit, aborting");
            self.pool.abort_transaction(self.tid);
        }
    }
}
