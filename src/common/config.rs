//! Configuration for the buffer pool and lock manager.

use std::time::Duration;

use crate::buffer::replacer::EvictionPolicy;
use crate::common::{Error, Result};

/// Default size of a page in bytes (4KB).
///
/// Collaborators that frame pages on disk must agree with whatever
/// [`BufferPoolConfig::page_size`] the pool is built with; this is only
/// the value used when nothing else is specified.
pub const PAGE_SIZE: usize = 4096;

/// Default number of resident pages.
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Default length of one lock polling round.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_millis(10);

/// Default number of failed polling rounds before a request is treated
/// as deadlocked.
pub const DEFAULT_LOCK_RETRIES: u32 = 10;

/// Construction-time settings for a [`BufferPoolManager`].
///
/// Nothing here can be changed once the pool exists.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use lockpool::BufferPoolConfig;
///
/// let config = BufferPoolConfig::new(16)
///     .with_page_size(1024)
///     .with_lock_wait(Duration::from_millis(5))
///     .with_lock_retries(20);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.lock_timeout(), Duration::from_millis(100));
/// ```
///
/// [`BufferPoolManager`]: crate::BufferPoolManager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Bytes per page.
    pub page_size: usize,

    /// Maximum number of resident pages.
    pub pool_size: usize,

    /// Length of a single polling round while waiting for a lock.
    pub lock_wait: Duration,

    /// Failed rounds tolerated before giving up with `Error::Deadlock`.
    pub lock_retries: u32,

    /// Replacement policy used when the pool is full.
    pub eviction: EvictionPolicy,

    /// Fixed seed for the random policy. `None` seeds from the OS.
    pub eviction_seed: Option<u64>,
}

impl BufferPoolConfig {
    /// Config with `pool_size` pages and defaults for everything else.
    pub fn new(pool_size: usize) -> Self {
        Self {
            page_size: PAGE_SIZE,
            pool_size,
            lock_wait: DEFAULT_LOCK_WAIT,
            lock_retries: DEFAULT_LOCK_RETRIES,
            eviction: EvictionPolicy::default(),
            eviction_seed: None,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_lock_wait(mut self, lock_wait: Duration) -> Self {
        self.lock_wait = lock_wait;
        self
    }

    pub fn with_lock_retries(mut self, lock_retries: u32) -> Self {
        self.lock_retries = lock_retries;
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn with_eviction_seed(mut self, seed: u64) -> Self {
        self.eviction_seed = Some(seed);
        self
    }

    /// Upper bound on how long a single lock request may wait, saturating
    /// at `Duration::MAX`.
    pub fn lock_timeout(&self) -> Duration {
        self.lock_wait.saturating_mul(self.lock_retries)
    }

    /// Check that the settings describe a usable pool.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if the pool or page size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::InvalidConfig("pool_size must be > 0".into()));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("page_size must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_PAGES)
    }
}
