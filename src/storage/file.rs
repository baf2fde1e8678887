//! The storage-file contract the buffer pool is built against.

use crate::buffer::BufferPoolManager;
use crate::common::{PageId, Result, TableId, TransactionId};
use crate::storage::page::{Page, PageRef};
use crate::storage::Tuple;

/// One table's on-disk file.
///
/// The pool calls `read_page` on a cache miss and `write_page` on flush.
/// Tuple mutations go the other way: the pool calls `insert_tuple` /
/// `delete_tuple`, the file fetches the pages it needs *through the pool*
/// (so they get locked), mutates them, and returns every page it touched
/// so the pool can mark them dirty.
///
/// Implementations are shared between threads, so all methods take
/// `&self`; use interior mutability (e.g. `Mutex<DiskManager>`) for the
/// file handle.
pub trait DbFile: Send + Sync {
    /// The table this file stores.
    fn table_id(&self) -> TableId;

    /// Read a page from storage.
    ///
    /// # Errors
    /// `PageNotFound` if `pid` is past the end of the file, `CorruptPage`
    /// if the bytes are malformed, `Io` on read failure.
    fn read_page(&self, pid: PageId) -> Result<Page>;

    /// Write a page back. Must be atomic for one page.
    fn write_page(&self, page: &Page) -> Result<()>;

    /// Store `tuple`, setting its `record_id`, and return every modified
    /// page (including freshly allocated ones).
    fn insert_tuple(
        &self,
        pool: &BufferPoolManager,
        tid: TransactionId,
        tuple: &mut Tuple,
    ) -> Result<Vec<PageRef>>;

    /// Remove `tuple` and return every modified page.
    fn delete_tuple(
        &self,
        pool: &BufferPoolManager,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> Result<Vec<PageRef>>;
}
