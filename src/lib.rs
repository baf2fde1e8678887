//! lockpool - A page buffer pool with an integrated strict two-phase lock manager.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           lockpool                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Transactions (concurrency/transaction)            │   │
//! │  │     begin → get_page / insert / delete → commit|abort    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Buffer Pool (buffer/)                     │   │
//! │  │   BufferPoolManager: lock → lookup → evict → load        │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  Eviction: Random | FIFO   (never locked/dirty)  │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │              ↓                               ↓                  │
//! │  ┌──────────────────────────┐  ┌────────────────────────────┐  │
//! │  │ Lock Manager             │  │ Storage (storage/)         │  │
//! │  │ (concurrency/)           │  │ Catalog → DbFile           │  │
//! │  │ SHARED / EXCLUSIVE, 2PL  │  │ DiskManager + Page + Tuple │  │
//! │  └──────────────────────────┘  └────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, TransactionId, Error, config)
//! - [`buffer`] - Page cache, transaction completion, eviction policies
//! - [`concurrency`] - Page locks and transaction handles
//! - [`storage`] - Pages, tuples, table files and the catalog
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use lockpool::{BufferPoolConfig, BufferPoolManager, PageId, Permission, TableCatalog, TableId};
//!
//! # fn main() -> lockpool::Result<()> {
//! let catalog = Arc::new(TableCatalog::new());
//! // catalog.add_table(...) for every table file
//!
//! let pool = BufferPoolManager::new(BufferPoolConfig::new(50), catalog)?;
//!
//! let txn = pool.begin();
//! let page = txn.get_page(PageId::new(TableId(1), 0), Permission::Shared)?;
//! let first_byte = page.read().as_slice()[0];
//! txn.commit()?;
//! # let _ = first_byte;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod common;
pub mod concurrency;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{BufferPoolConfig, Error, PageId, Result, TableId, TransactionId};

pub use buffer::{BufferPoolManager, BufferPoolStats, EvictionPolicy, StatsSnapshot};
pub use concurrency::{LockManager, Permission, Transaction};
pub use storage::{Catalog, DbFile, DiskManager, Page, PageRef, RecordId, TableCatalog, Tuple};
