//! Page and table identifier types.

use std::fmt;

/// Identifies a table, and through the catalog, the file that stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table({})", self.0)
    }
}

/// Identifies a page: the owning table plus the page number inside
/// that table's file.
///
/// This is the key for both the page table and the lock table.
///
/// # Example
/// ```
/// use lockpool::{PageId, TableId};
///
/// let page_id = PageId::new(TableId(3), 42);
/// assert_eq!(page_id.table_id, TableId(3));
/// assert_eq!(page_id.page_no, 42);
/// assert_eq!(page_id.to_string(), "Page(3:42)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: u32,
}

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(table_id: TableId, page_no: u32) -> Self {
        PageId { table_id, page_no }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({}:{})", self.table_id.0, self.page_no)
    }
}
