//! Tuples as seen by the pool: opaque bytes plus where they live.

use crate::common::PageId;

/// Location of a stored tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

/// A row handed to a [`DbFile`](crate::storage::DbFile) for insertion or
/// deletion.
///
/// The pool only looks at `record_id` (to route a delete to the right
/// file). The payload format belongs to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub data: Vec<u8>,
    /// Set by the file once the tuple has been stored.
    pub record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            record_id: None,
        }
    }
}
