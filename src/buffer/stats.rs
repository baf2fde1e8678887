//! Buffer pool statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics tracked by the buffer pool.
///
/// All fields are atomic for lock-free, thread-safe updates.
/// Multiple threads can increment counters without locks.
///
/// # Memory Ordering
/// We use `Ordering::Relaxed` for all operations because:
/// - We only need atomicity (no partial updates)
/// - We don't need synchronization between different counters
/// - Statistics are "eventually consistent" - exact ordering doesn't matter
///
/// # Example
/// ```
/// use lockpool::BufferPoolStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = BufferPoolStats::new();
/// stats.cache_hits.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.cache_hits.load(Ordering::Relaxed), 1);
/// ```
#[derive(Debug, Default)]
pub struct BufferPoolStats {
    /// Number of times a page was found in the buffer pool.
    pub cache_hits: AtomicU64,

    /// Number of times a page had to be loaded from its file.
    pub cache_misses: AtomicU64,

    /// Number of pages evicted to make room.
    pub evictions: AtomicU64,

    /// Number of pages read from files.
    pub pages_read: AtomicU64,

    /// Number of pages written back to files.
    pub pages_written: AtomicU64,

    /// Number of pages dropped without write-back (abort or explicit discard).
    pub pages_discarded: AtomicU64,

    /// Number of committed transactions.
    pub commits: AtomicU64,

    /// Number of aborted transactions.
    pub aborts: AtomicU64,
}

impl BufferPoolStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    /// Get a snapshot of current statistics.
    ///
    /// This returns a non-atomic copy for display/logging.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
            pages_discarded: self.pages_discarded.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            aborts: self.aborts.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        for counter in [
            &self.cache_hits,
            &self.cache_misses,
            &self.evictions,
            &self.pages_read,
            &self.pages_written,
            &self.pages_discarded,
            &self.commits,
            &self.aborts,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// A point-in-time snapshot of buffer pool statistics.
///
/// Unlike `BufferPoolStats`, this is not atomic and can be safely
/// printed, compared, etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub pages_read: u64,
    pub pages_written: u64,
    pub pages_discarded: u64,
    pub commits: u64,
    pub aborts: u64,
}

impl StatsSnapshot {
    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, evictions: {}, written: {}, discarded: {}, commits: {}, aborts: {}, hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.pages_written,
            self.pages_discarded,
            self.commits,
            self.aborts,
            self.hit_rate() * 100.0
        )
    }
}
