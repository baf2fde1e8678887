//! Transaction identifier type.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque token naming a transaction.
///
/// Created by the caller before the transaction touches any page and
/// passed to every pool and lock operation. Ids from [`TransactionId::new`]
/// are unique for the life of the process.
///
/// # Example
/// ```
/// use lockpool::TransactionId;
///
/// let a = TransactionId::new();
/// let b = TransactionId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Mint a fresh, process-unique id.
    pub fn new() -> Self {
        TransactionId(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an id allocated elsewhere (e.g. by an outer transaction layer).
    #[inline]
    pub fn from_raw(id: u64) -> Self {
        TransactionId(id)
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txn({})", self.0)
    }
}
