//! Error types for lockpool.

use thiserror::Error;

use crate::common::{PageId, TableId, TransactionId};
use crate::concurrency::Permission;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors raised by the buffer pool, the lock manager and
/// their storage collaborators.
///
/// None of these are retried by the pool itself. Whether to abort the
/// transaction is the caller's decision; [`Error::requires_abort`] says
/// which variants leave no other sensible choice.
#[derive(Debug, Error)]
pub enum Error {
    /// A lock request ran out of polling rounds.
    ///
    /// This is a timeout heuristic, not proof of a wait-for cycle.
    #[error("{tid} timed out waiting for {perm} lock on {pid} (presumed deadlock)")]
    Deadlock {
        tid: TransactionId,
        pid: PageId,
        perm: Permission,
    },

    /// No resident page is both unlocked and clean, so nothing can be
    /// evicted without violating 2PL or writing uncommitted data.
    #[error("buffer pool exhausted: none of the {resident} resident pages can be evicted")]
    CacheExhausted { resident: usize },

    /// I/O error from a collaborator, passed through unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page is past the end of its file.
    #[error("{0} not found")]
    PageNotFound(PageId),

    /// The bytes on disk could not be turned into a page.
    #[error("{pid} is corrupt: {reason}")]
    CorruptPage { pid: PageId, reason: String },

    /// The table component of a page id is not registered in the catalog.
    #[error("no database file registered for {0}")]
    InvalidPageReference(TableId),

    /// A page's payload does not match the configured page size.
    #[error("{pid} has {actual} bytes, expected {expected}")]
    PageSizeMismatch {
        pid: PageId,
        expected: usize,
        actual: usize,
    },

    /// Tried to delete a tuple that was never stored.
    #[error("tuple has no record id")]
    MissingRecordId,

    /// Rejected construction-time settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether this is a lock timeout.
    pub fn is_deadlock(&self) -> bool {
        matches!(self, Error::Deadlock { .. })
    }

    /// Whether the owning transaction has to be aborted to make progress.
    pub fn requires_abort(&self) -> bool {
        matches!(self, Error::Deadlock { .. } | Error::CacheExhausted { .. })
    }
}
