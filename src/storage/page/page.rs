//! Page - the fixed-size unit of caching, locking and I/O.
//!
//! A [`Page`] is an opaque byte payload plus the identity it was loaded
//! under and a dirty marker naming the transaction that modified it.
//! The pool never interprets the bytes; that is up to the [`DbFile`]
//! that produced the page.
//!
//! [`DbFile`]: crate::storage::DbFile

use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{PageId, TransactionId};

/// Shared handle to a cached page.
///
/// The pool hands these out from `get_page`; collaborators hand them
/// back from `insert_tuple`/`delete_tuple`. The `RwLock` only protects
/// the bytes from torn reads. Whether a caller may write at all is
/// decided by the page lock it holds in the lock manager.
pub type PageRef = Arc<RwLock<Page>>;

/// A page of data.
///
/// # Dirty marker
/// `dirty` is `Some(tid)` while the page holds changes made by `tid` that
/// have not been written back. Only one writer can hold an exclusive lock
/// at a time, so a single owner is enough.
///
/// # Example
/// ```
/// use lockpool::{Page, PageId, TableId, TransactionId};
///
/// let mut page = Page::new(PageId::new(TableId(1), 0), 128);
/// page.as_mut_slice()[0] = 0xFF;
///
/// let tid = TransactionId::new();
/// page.mark_dirty(tid);
/// assert_eq!(page.is_dirty(), Some(tid));
/// ```
#[derive(Debug)]
pub struct Page {
    id: PageId,
    data: Box<[u8]>,
    dirty: Option<TransactionId>,
}

impl Page {
    /// Create a new zeroed page of `page_size` bytes.
    pub fn new(id: PageId, page_size: usize) -> Self {
        Self {
            id,
            data: vec![0u8; page_size].into_boxed_slice(),
            dirty: None,
        }
    }

    /// Wrap bytes read from storage. The page starts clean.
    pub fn from_bytes(id: PageId, data: Vec<u8>) -> Self {
        Self {
            id,
            data: data.into_boxed_slice(),
            dirty: None,
        }
    }

    /// Move the page behind a shared handle.
    pub fn into_ref(self) -> PageRef {
        Arc::new(RwLock::new(self))
    }

    #[inline]
    pub fn id(&self) -> PageId {
        self.id
    }

    /// The transaction whose changes are still unwritten, if any.
    #[inline]
    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirty
    }

    /// Record that `tid` modified this page.
    #[inline]
    pub fn mark_dirty(&mut self, tid: TransactionId) {
        self.dirty = Some(tid);
    }

    /// Forget the dirty owner, typically right after a write-back.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = None;
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }
}
