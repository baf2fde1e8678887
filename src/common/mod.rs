//! Common types and utilities shared across lockpool.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`BufferPoolConfig`]
//! - Error types
//! - Identifiers (PageId, TableId, TransactionId)

pub mod config;
pub mod error;
mod page_id;
mod transaction_id;

pub use config::BufferPoolConfig;
pub use error::{Error, Result};
pub use page_id::{PageId, TableId};
pub use transaction_id::TransactionId;
