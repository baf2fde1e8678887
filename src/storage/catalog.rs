//! Routing from table ids to their files.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::TableId;
use crate::storage::DbFile;

/// Resolves the table component of a [`PageId`](crate::PageId) to the
/// file that owns it.
pub trait Catalog: Send + Sync {
    fn database_file(&self, table_id: TableId) -> Option<Arc<dyn DbFile>>;
}

/// A simple in-memory [`Catalog`] keyed by table id.
///
/// Lookups take a read lock, so concurrent fetches don't serialize here.
#[derive(Default)]
pub struct TableCatalog {
    files: RwLock<HashMap<TableId, Arc<dyn DbFile>>>,
}

impl TableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under its own table id, replacing any previous one.
    pub fn add_table(&self, file: Arc<dyn DbFile>) -> Option<Arc<dyn DbFile>> {
        self.files.write().insert(file.table_id(), file)
    }

    pub fn remove_table(&self, table_id: TableId) -> Option<Arc<dyn DbFile>> {
        self.files.write().remove(&table_id)
    }

    /// Registered table ids in ascending order.
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.files.read().keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Catalog for TableCatalog {
    fn database_file(&self, table_id: TableId) -> Option<Arc<dyn DbFile>> {
        self.files.read().get(&table_id).cloned()
    }
}
