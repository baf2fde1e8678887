//! Buffer pool management.
//!
//! The buffer pool is the in-memory page cache between transactions and
//! table files. Every fetch goes through the lock manager first, so the
//! pool is also where strict two-phase locking is enforced.
//!
//! # Components
//! - [`BufferPoolManager`] - The page cache and transaction coordinator
//! - [`BufferPoolStats`] - Performance statistics
//! - [`replacer`] - Eviction policy implementations

mod buffer_pool_manager;
mod page_table;
pub mod replacer;
mod stats;

pub use buffer_pool_manager::BufferPoolManager;
pub use replacer::EvictionPolicy;
pub use stats::{BufferPoolStats, StatsSnapshot};
