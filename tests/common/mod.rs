//! Shared fixtures for the integration tests.
//!
//! [`HeapFile`] is a tiny slotted table file: each page holds fixed-size
//! records, byte 0 of a record is its length + 1 (0 = free slot). It
//! fetches every page it touches through the pool, like a real access
//! method would.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lockpool::{
    BufferPoolConfig, BufferPoolManager, DbFile, DiskManager, Error, Page, PageId, PageRef,
    Permission, RecordId, Result, TableCatalog, TableId, TransactionId, Tuple,
};
use parking_lot::Mutex;

/// Small pages so tables span several of them quickly.
pub const PAGE_SIZE: usize = 64;

/// Bytes per record slot, including the length byte.
pub const RECORD_SIZE: usize = 16;

pub const SLOTS_PER_PAGE: usize = PAGE_SIZE / RECORD_SIZE;

/// Route `tracing` output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Page stores
// ============================================================================

/// Where a [`HeapFile`] keeps its pages.
pub trait PageStore: Send + Sync {
    fn read(&self, pid: PageId) -> Result<Page>;
    fn write(&self, page: &Page) -> Result<()>;
    fn num_pages(&self) -> u32;
    fn allocate(&self) -> Result<PageId>;
}

/// Pages in a `Vec`, for tests that don't care about the filesystem.
pub struct MemStore {
    table_id: TableId,
    pages: Mutex<Vec<Vec<u8>>>,
}

impl MemStore {
    pub fn new(table_id: TableId, num_pages: u32) -> Self {
        Self {
            table_id,
            pages: Mutex::new(vec![vec![0u8; PAGE_SIZE]; num_pages as usize]),
        }
    }
}

impl PageStore for MemStore {
    fn read(&self, pid: PageId) -> Result<Page> {
        let pages = self.pages.lock();
        let data = pages
            .get(pid.page_no as usize)
            .ok_or(Error::PageNotFound(pid))?;
        Ok(Page::from_bytes(pid, data.clone()))
    }

    fn write(&self, page: &Page) -> Result<()> {
        let mut pages = self.pages.lock();
        let slot = pages
            .get_mut(page.id().page_no as usize)
            .ok_or(Error::PageNotFound(page.id()))?;
        slot.copy_from_slice(page.as_slice());
        Ok(())
    }

    fn num_pages(&self) -> u32 {
        self.pages.lock().len() as u32
    }

    fn allocate(&self) -> Result<PageId> {
        let mut pages = self.pages.lock();
        pages.push(vec![0u8; PAGE_SIZE]);
        Ok(PageId::new(self.table_id, pages.len() as u32 - 1))
    }
}

/// Pages in a real file through [`DiskManager`].
pub struct DiskStore(Mutex<DiskManager>);

impl PageStore for DiskStore {
    fn read(&self, pid: PageId) -> Result<Page> {
        self.0.lock().read_page(pid)
    }

    fn write(&self, page: &Page) -> Result<()> {
        self.0.lock().write_page(page)
    }

    fn num_pages(&self) -> u32 {
        self.0.lock().page_count()
    }

    fn allocate(&self) -> Result<PageId> {
        self.0.lock().allocate_page()
    }
}

// ============================================================================
// HeapFile
// ============================================================================

pub struct HeapFile<S> {
    table_id: TableId,
    store: S,
    /// Every page written back, in order.
    writes: Mutex<Vec<PageId>>,
    fail_writes: AtomicBool,
}

impl<S: PageStore> HeapFile<S> {
    pub fn new(table_id: TableId, store: S) -> Self {
        Self {
            table_id,
            store,
            writes: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn write_log(&self) -> Vec<PageId> {
        self.writes.lock().clone()
    }

    pub fn num_pages(&self) -> u32 {
        self.store.num_pages()
    }

    /// Make every subsequent `write_page` fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Records stored on disk for `page_no`, bypassing the pool.
    pub fn records_on_disk(&self, page_no: u32) -> Vec<Vec<u8>> {
        let page = self
            .store
            .read(PageId::new(self.table_id, page_no))
            .unwrap();
        records(&page)
    }
}

impl<S: PageStore> DbFile for HeapFile<S> {
    fn table_id(&self) -> TableId {
        self.table_id
    }

    fn read_page(&self, pid: PageId) -> Result<Page> {
        self.store.read(pid)
    }

    fn write_page(&self, page: &Page) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("injected write failure")));
        }
        self.store.write(page)?;
        self.writes.lock().push(page.id());
        Ok(())
    }

    fn insert_tuple(
        &self,
        pool: &BufferPoolManager,
        tid: TransactionId,
        tuple: &mut Tuple,
    ) -> Result<Vec<PageRef>> {
        assert!(tuple.data.len() < RECORD_SIZE, "record too large");

        for page_no in 0..self.store.num_pages() {
            let pid = PageId::new(self.table_id, page_no);
            let held_before = pool.holds_lock(tid, pid);

            let page = pool.get_page(tid, pid, Permission::Shared)?;
            let free = free_slot(&page.read());
            match free {
                Some(slot) => {
                    let page = pool.get_page(tid, pid, Permission::Exclusive)?;
                    write_record(&mut page.write(), slot, &tuple.data);
                    tuple.record_id = Some(RecordId::new(pid, slot as u16));
                    return Ok(vec![page]);
                }
                None if !held_before => pool.release_page(tid, pid),
                None => {}
            }
        }

        let pid = self.store.allocate()?;
        let page = pool.get_page(tid, pid, Permission::Exclusive)?;
        write_record(&mut page.write(), 0, &tuple.data);
        tuple.record_id = Some(RecordId::new(pid, 0));
        Ok(vec![page])
    }

    fn delete_tuple(
        &self,
        pool: &BufferPoolManager,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> Result<Vec<PageRef>> {
        let rid = tuple.record_id.ok_or(Error::MissingRecordId)?;
        let page = pool.get_page(tid, rid.page_id, Permission::Exclusive)?;
        {
            let mut guard = page.write();
            let start = rid.slot as usize * RECORD_SIZE;
            if guard.as_slice()[start] == 0 {
                return Err(Error::CorruptPage {
                    pid: rid.page_id,
                    reason: format!("slot {} is empty", rid.slot),
                });
            }
            guard.as_mut_slice()[start..start + RECORD_SIZE].fill(0);
        }
        Ok(vec![page])
    }
}

// ============================================================================
// Record layout helpers
// ============================================================================

pub fn free_slot(page: &Page) -> Option<usize> {
    (0..SLOTS_PER_PAGE).find(|&slot| page.as_slice()[slot * RECORD_SIZE] == 0)
}

pub fn write_record(page: &mut Page, slot: usize, data: &[u8]) {
    let start = slot * RECORD_SIZE;
    let bytes = page.as_mut_slice();
    bytes[start] = data.len() as u8 + 1;
    bytes[start + 1..start + 1 + data.len()].copy_from_slice(data);
}

/// Payloads of all used slots, in slot order.
pub fn records(page: &Page) -> Vec<Vec<u8>> {
    (0..SLOTS_PER_PAGE)
        .filter_map(|slot| {
            let start = slot * RECORD_SIZE;
            let len = page.as_slice()[start] as usize;
            (len > 0).then(|| page.as_slice()[start + 1..start + len].to_vec())
        })
        .collect()
}

// ============================================================================
// Pool builders
// ============================================================================

pub fn mem_table(table_id: u32, num_pages: u32) -> Arc<HeapFile<MemStore>> {
    let table_id = TableId(table_id);
    Arc::new(HeapFile::new(table_id, MemStore::new(table_id, num_pages)))
}

pub fn disk_table(dir: &Path, table_id: u32) -> Arc<HeapFile<DiskStore>> {
    let table_id = TableId(table_id);
    let path = dir.join(format!("table_{}.dat", table_id.0));
    let dm = DiskManager::open_or_create(path, table_id, PAGE_SIZE).unwrap();
    Arc::new(HeapFile::new(table_id, DiskStore(Mutex::new(dm))))
}

/// Config with small pages, a seeded replacer and short lock rounds.
pub fn test_config(pool_size: usize) -> BufferPoolConfig {
    BufferPoolConfig::new(pool_size)
        .with_page_size(PAGE_SIZE)
        .with_lock_wait(Duration::from_millis(5))
        .with_lock_retries(10)
        .with_eviction_seed(7)
}

pub fn create_pool(config: BufferPoolConfig, files: Vec<Arc<dyn DbFile>>) -> BufferPoolManager {
    init_tracing();
    let catalog = TableCatalog::new();
    for file in files {
        catalog.add_table(file);
    }
    BufferPoolManager::new(config, Arc::new(catalog)).unwrap()
}
