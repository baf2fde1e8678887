//! Concurrency control.
//!
//! - [`LockManager`] - Page-level shared/exclusive locks (strict 2PL)
//! - [`Permission`] - Lock modes
//! - [`Transaction`] - RAII handle that commits or aborts through the pool

mod lock_manager;
mod permission;
mod transaction;

pub use lock_manager::{LockManager, LockStats, LockStatsSnapshot};
pub use permission::Permission;
pub use transaction::Transaction;
