//! Storage layer - the collaborators the buffer pool reads and writes through.
//!
//! This module handles persistent storage:
//! - [`DbFile`] / [`Catalog`] - The contracts the pool is built against
//! - [`TableCatalog`] - A table-id keyed catalog
//! - [`DiskManager`] - Page-granular file I/O for `DbFile` implementors
//! - [`page`] - Page type and shared handle
//! - [`Tuple`] / [`RecordId`] - Opaque rows routed through the pool

mod catalog;
mod disk_manager;
mod file;
pub mod page;
mod tuple;

pub use catalog::{Catalog, TableCatalog};
pub use disk_manager::DiskManager;
pub use file::DbFile;
pub use page::{Page, PageRef};
pub use tuple::{RecordId, Tuple};
