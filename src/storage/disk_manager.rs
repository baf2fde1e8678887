//! Disk Manager - page-granular file I/O for one table.
//!
//! The [`DiskManager`] is the building block [`DbFile`] implementations
//! use to move whole pages between a file and memory:
//! - Reading and writing pages
//! - Allocating new pages
//! - Managing the table's file
//!
//! [`DbFile`]: crate::storage::DbFile

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::trace;

use crate::common::{Error, PageId, Result, TableId};
use crate::storage::page::Page;

/// Manages disk I/O for a single table file.
///
/// # File Layout
/// Pages are laid out back to back:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0    size    2×size    ...    N×size
/// ```
///
/// Page N is located at file offset `N × page_size`.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. Wrap it in a `Mutex` inside the
/// owning `DbFile`.
///
/// # Durability
/// Every write is followed by `fsync()`, so a page write either fully
/// reaches disk or reports an error.
pub struct DiskManager {
    file: File,
    table_id: TableId,
    page_size: usize,
    /// Number of complete pages in the file.
    page_count: u32,
    /// Bytes past the last complete page (a torn trailing page).
    trailing_bytes: u64,
}

impl DiskManager {
    /// Create a new table file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created,
    /// or `Error::InvalidConfig` if `page_size` is zero.
    pub fn create<P: AsRef<Path>>(path: P, table_id: TableId, page_size: usize) -> Result<Self> {
        check_page_size(page_size)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            table_id,
            page_size,
            page_count: 0,
            trailing_bytes: 0,
        })
    }

    /// Open an existing table file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened,
    /// or `Error::InvalidConfig` if `page_size` is zero.
    pub fn open<P: AsRef<Path>>(path: P, table_id: TableId, page_size: usize) -> Result<Self> {
        check_page_size(page_size)?;
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        let page_count = (file_size / page_size as u64) as u32;
        let trailing_bytes = file_size % page_size as u64;

        Ok(Self {
            file,
            table_id,
            page_size,
            page_count,
            trailing_bytes,
        })
    }

    /// Open an existing table file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(
        path: P,
        table_id: TableId,
        page_size: usize,
    ) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path, table_id, page_size)
        } else {
            Self::create(path, table_id, page_size)
        }
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page is past the end of the file
    /// - `Error::CorruptPage` if only part of the page is on disk
    /// - `Error::InvalidPageReference` if `pid` belongs to another table
    pub fn read_page(&mut self, pid: PageId) -> Result<Page> {
        self.check_table(pid)?;
        if pid.page_no >= self.page_count {
            if pid.page_no == self.page_count && self.trailing_bytes > 0 {
                return Err(Error::CorruptPage {
                    pid,
                    reason: format!(
                        "truncated: {} of {} bytes on disk",
                        self.trailing_bytes, self.page_size
                    ),
                });
            }
            return Err(Error::PageNotFound(pid));
        }

        self.file.seek(SeekFrom::Start(self.offset(pid)))?;

        let mut data = vec![0u8; self.page_size];
        self.file.read_exact(&mut data)?;

        trace!(%pid, "read page");
        Ok(Page::from_bytes(pid, data))
    }

    /// Write a page to disk.
    ///
    /// The page must have been previously allocated with `allocate_page()`.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page hasn't been allocated
    /// - `Error::PageSizeMismatch` if the payload isn't exactly one page
    pub fn write_page(&mut self, page: &Page) -> Result<()> {
        let pid = page.id();
        self.check_table(pid)?;
        if pid.page_no >= self.page_count {
            return Err(Error::PageNotFound(pid));
        }
        if page.len() != self.page_size {
            return Err(Error::PageSizeMismatch {
                pid,
                expected: self.page_size,
                actual: page.len(),
            });
        }

        self.file.seek(SeekFrom::Start(self.offset(pid)))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?; // fsync for durability

        trace!(%pid, "wrote page");
        Ok(())
    }

    /// Allocate a new zeroed page at the end of the file.
    ///
    /// A torn trailing page left by an earlier crash is overwritten.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let pid = PageId::new(self.table_id, self.page_count);

        self.file.seek(SeekFrom::Start(self.offset(pid)))?;

        let zeros = vec![0u8; self.page_size];
        self.file.write_all(&zeros)?;
        self.file.sync_all()?;

        self.page_count += 1;
        self.trailing_bytes = 0;
        Ok(pid)
    }

    #[inline]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Get the number of pages in the file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the size of the allocated pages in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (self.page_size as u64)
    }

    fn offset(&self, pid: PageId) -> u64 {
        (pid.page_no as u64) * (self.page_size as u64)
    }

    fn check_table(&self, pid: PageId) -> Result<()> {
        if pid.table_id != self.table_id {
            return Err(Error::InvalidPageReference(pid.table_id));
        }
        Ok(())
    }
}

fn check_page_size(page_size: usize) -> Result<()> {
    if page_size == 0 {
        return Err(Error::InvalidConfig("page_size must be > 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TABLE: TableId = TableId(1);
    const SIZE: usize = 4096;

    fn pid(n: u32) -> PageId {
        PageId::new(TABLE, n)
    }

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.tbl");

        let dm = DiskManager::create(&path, TABLE, SIZE).unwrap();
        assert_eq!(dm.page_count(), 0);
        assert_eq!(dm.file_size(), 0);
        assert_eq!(dm.table_id(), TABLE);
        assert_eq!(dm.page_size(), SIZE);
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.tbl");

        DiskManager::create(&path, TABLE, SIZE).unwrap();
        assert!(DiskManager::create(&path, TABLE, SIZE).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.tbl");

        assert!(DiskManager::open(&path, TABLE, SIZE).is_err());
    }

    #[test]
    fn test_allocate_and_read_page() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.tbl"), TABLE, SIZE).unwrap();

        let page_id = dm.allocate_page().unwrap();
        assert_eq!(page_id, pid(0));
        assert_eq!(dm.page_count(), 1);

        let page = dm.read_page(page_id).unwrap();
        assert_eq!(page.id(), page_id);
        assert_eq!(page.len(), SIZE);
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[SIZE - 1], 0);
        assert!(page.is_dirty().is_none());
    }

    #[test]
    fn test_write_and_read_page() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.tbl"), TABLE, SIZE).unwrap();
        let page_id = dm.allocate_page().unwrap();

        let mut page = Page::new(page_id, SIZE);
        page.as_mut_slice()[0] = 0xAB;
        page.as_mut_slice()[100] = 0xCD;
        page.as_mut_slice()[SIZE - 1] = 0xEF;

        dm.write_page(&page).unwrap();

        let read_page = dm.read_page(page_id).unwrap();
        assert_eq!(read_page.as_slice()[0], 0xAB);
        assert_eq!(read_page.as_slice()[100], 0xCD);
        assert_eq!(read_page.as_slice()[SIZE - 1], 0xEF);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.tbl");

        {
            let mut dm = DiskManager::create(&path, TABLE, SIZE).unwrap();
            let page_id = dm.allocate_page().unwrap();

            let mut page = Page::new(page_id, SIZE);
            page.as_mut_slice()[0] = 0x42;
            dm.write_page(&page).unwrap();
        }

        {
            let mut dm = DiskManager::open(&path, TABLE, SIZE).unwrap();
            assert_eq!(dm.page_count(), 1);

            let page = dm.read_page(pid(0)).unwrap();
            assert_eq!(page.as_slice()[0], 0x42);
        }
    }

    #[test]
    fn test_small_pages() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("small.tbl"), TABLE, 64).unwrap();

        for i in 0..10u32 {
            let page_id = dm.allocate_page().unwrap();
            assert_eq!(page_id.page_no, i);

            let mut page = Page::new(page_id, 64);
            page.as_mut_slice()[0] = i as u8;
            dm.write_page(&page).unwrap();
        }

        assert_eq!(dm.file_size(), 640);
        for i in 0..10u32 {
            assert_eq!(dm.read_page(pid(i)).unwrap().as_slice()[0], i as u8);
        }
    }

    #[test]
    fn test_read_invalid_page() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.tbl"), TABLE, SIZE).unwrap();
        dm.allocate_page().unwrap();

        assert!(matches!(dm.read_page(pid(1)), Err(Error::PageNotFound(p)) if p == pid(1)));
    }

    #[test]
    fn test_read_other_table_rejected() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.tbl"), TABLE, SIZE).unwrap();
        dm.allocate_page().unwrap();

        let foreign = PageId::new(TableId(2), 0);
        assert!(matches!(
            dm.read_page(foreign),
            Err(Error::InvalidPageReference(TableId(2)))
        ));
    }

    #[test]
    fn test_truncated_page_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torn.tbl");
        std::fs::write(&path, vec![1u8; 64 + 10]).unwrap();

        let mut dm = DiskManager::open(&path, TABLE, 64).unwrap();
        assert_eq!(dm.page_count(), 1);
        assert!(dm.read_page(pid(0)).is_ok());
        assert!(matches!(dm.read_page(pid(1)), Err(Error::CorruptPage { .. })));
        assert!(matches!(dm.read_page(pid(2)), Err(Error::PageNotFound(_))));
    }

    #[test]
    fn test_write_invalid_page() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.tbl"), TABLE, SIZE).unwrap();

        // No pages allocated yet
        let page = Page::new(pid(0), SIZE);
        assert!(dm.write_page(&page).is_err());
    }

    #[test]
    fn test_write_wrong_size_rejected() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.tbl"), TABLE, SIZE).unwrap();
        let page_id = dm.allocate_page().unwrap();

        let page = Page::new(page_id, 100);
        assert!(matches!(
            dm.write_page(&page),
            Err(Error::PageSizeMismatch { expected: SIZE, actual: 100, .. })
        ));
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.tbl");

        {
            let mut dm = DiskManager::open_or_create(&path, TABLE, SIZE).unwrap();
            assert_eq!(dm.page_count(), 0);
            dm.allocate_page().unwrap();
        }

        {
            let dm = DiskManager::open_or_create(&path, TABLE, SIZE).unwrap();
            assert_eq!(dm.page_count(), 1);
        }
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.tbl");

        assert!(matches!(
            DiskManager::create(&path, TABLE, 0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(!path.exists());

        std::fs::write(&path, vec![0u8; 128]).unwrap();
        assert!(matches!(
            DiskManager::open(&path, TABLE, 0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            DiskManager::open_or_create(&path, TABLE, 0),
            Err(Error::InvalidConfig(_))
        ));
    }
}
