//! Lock Manager - page-level strict two-phase locking.
//!
//! The [`LockManager`] provides:
//! - Shared/exclusive page locks with SHARED → EXCLUSIVE upgrade
//! - Blocking acquisition in bounded polling rounds
//! - A timeout-based deadlock signal (no wait-for graph)
//! - O(1) release of everything a transaction holds

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::common::config::{DEFAULT_LOCK_RETRIES, DEFAULT_LOCK_WAIT};
use crate::common::{Error, PageId, Result, TransactionId};
use crate::concurrency::Permission;

/// What a successful grant changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    New,
    Upgrade,
    AlreadyHeld,
}

/// Both directions of the lock table, kept in step.
///
/// Empty entries are removed eagerly, so "present in `page_locks`" means
/// "locked by someone".
#[derive(Debug, Default)]
struct LockTable {
    /// Holders of each locked page.
    page_locks: HashMap<PageId, HashMap<TransactionId, Permission>>,
    /// Pages locked by each transaction.
    txn_locks: HashMap<TransactionId, HashSet<PageId>>,
}

impl LockTable {
    fn mode(&self, tid: TransactionId, pid: PageId) -> Option<Permission> {
        self.page_locks
            .get(&pid)
            .and_then(|holders| holders.get(&tid))
            .copied()
    }

    /// Can `tid` be granted `perm` on `pid` right now?
    fn is_compatible(&self, tid: TransactionId, pid: PageId, perm: Permission) -> bool {
        let Some(holders) = self.page_locks.get(&pid) else {
            return true;
        };

        if holders.contains_key(&tid) {
            return match perm {
                Permission::Shared => true,
                // Upgrade only as the sole holder.
                Permission::Exclusive => holders.len() == 1,
            };
        }

        match perm {
            Permission::Shared => holders.values().all(|held| !held.is_exclusive()),
            Permission::Exclusive => holders.is_empty(),
        }
    }

    /// Record a grant. Caller must have checked compatibility.
    fn grant(&mut self, tid: TransactionId, pid: PageId, perm: Permission) -> Grant {
        let holders = self.page_locks.entry(pid).or_default();
        let grant = match holders.get(&tid) {
            None => Grant::New,
            Some(&held) if perm > held => Grant::Upgrade,
            // Never downgrade.
            Some(_) => Grant::AlreadyHeld,
        };
        if grant != Grant::AlreadyHeld {
            holders.insert(tid, perm);
        }
        self.txn_locks.entry(tid).or_default().insert(pid);
        grant
    }

    fn release(&mut self, tid: TransactionId, pid: PageId) -> bool {
        let removed = match self.page_locks.get_mut(&pid) {
            Some(holders) => {
                let removed = holders.remove(&tid).is_some();
                if holders.is_empty() {
                    self.page_locks.remove(&pid);
                }
                removed
            }
            None => false,
        };

        if let Some(pages) = self.txn_locks.get_mut(&tid) {
            pages.remove(&pid);
            if pages.is_empty() {
                self.txn_locks.remove(&tid);
            }
        }

        removed
    }

    fn release_all(&mut self, tid: TransactionId) -> usize {
        let Some(pages) = self.txn_locks.remove(&tid) else {
            return 0;
        };

        for pid in &pages {
            if let Some(holders) = self.page_locks.get_mut(pid) {
                holders.remove(&tid);
                if holders.is_empty() {
                    self.page_locks.remove(pid);
                }
            }
        }

        pages.len()
    }
}

/// Counters kept by the lock manager.
#[derive(Debug, Default)]
pub struct LockStats {
    /// Requests that ended with the lock held (including no-op re-requests).
    pub granted: AtomicU64,

    /// SHARED → EXCLUSIVE upgrades.
    pub upgrades: AtomicU64,

    /// Requests that had to wait at least one round.
    pub waits: AtomicU64,

    /// Requests that gave up with `Error::Deadlock`.
    pub deadlocks: AtomicU64,

    /// Individual locks released.
    pub released: AtomicU64,
}

impl LockStats {
    pub fn snapshot(&self) -> LockStatsSnapshot {
        LockStatsSnapshot {
            granted: self.granted.load(Ordering::Relaxed),
            upgrades: self.upgrades.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            deadlocks: self.deadlocks.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`LockStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatsSnapshot {
    pub granted: u64,
    pub upgrades: u64,
    pub waits: u64,
    pub deadlocks: u64,
    pub released: u64,
}

impl fmt::Display for LockStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Locks {{ granted: {}, upgrades: {}, waits: {}, deadlocks: {}, released: {} }}",
            self.granted, self.upgrades, self.waits, self.deadlocks, self.released
        )
    }
}

/// Page-level lock table implementing strict 2PL.
///
/// # Compatibility
/// For a request `(tid, pid, perm)`:
/// - `tid` already holds a lock on `pid`: `Shared` is a no-op;
///   `Exclusive` is granted only if `tid` is the sole holder (upgrade).
/// - otherwise: `Shared` is granted if nobody holds `Exclusive`;
///   `Exclusive` only if nobody holds anything.
///
/// # Waiting
/// [`acquire`](Self::acquire) waits in rounds of `lock_wait`. Inside a
/// round, every release wakes the waiter for a recheck without using up
/// the round. After `lock_retries` failed rounds it returns
/// `Error::Deadlock`. The manager never aborts anyone itself, and there is
/// no fairness between waiters.
///
/// # Thread Safety
/// - `table`: `Mutex`, every query and mutation is serialized
/// - `released`: `Condvar`, notified on every release
/// - `stats`: no lock, all atomic counters
pub struct LockManager {
    table: Mutex<LockTable>,
    released: Condvar,
    lock_wait: Duration,
    lock_retries: u32,
    stats: LockStats,
}

impl LockManager {
    pub fn new(lock_wait: Duration, lock_retries: u32) -> Self {
        Self {
            table: Mutex::new(LockTable::default()),
            released: Condvar::new(),
            lock_wait,
            lock_retries,
            stats: LockStats::default(),
        }
    }

    /// Block until `tid` holds `perm` on `pid`.
    ///
    /// # Errors
    /// `Error::Deadlock` once `lock_retries` rounds have passed without the
    /// lock becoming compatible. The caller must abort `tid`.
    pub fn acquire(&self, tid: TransactionId, pid: PageId, perm: Permission) -> Result<()> {
        let mut table = self.table.lock();
        let mut failed_rounds = 0;

        loop {
            if table.is_compatible(tid, pid, perm) {
                let grant = table.grant(tid, pid, perm);
                self.record_grant(grant);
                trace!(%tid, %pid, %perm, ?grant, "lock granted");
                return Ok(());
            }

            if failed_rounds == self.lock_retries {
                self.stats.deadlocks.fetch_add(1, Ordering::Relaxed);
                warn!(%tid, %pid, %perm, rounds = failed_rounds, "lock wait exhausted, presumed deadlock");
                return Err(Error::Deadlock { tid, pid, perm });
            }

            if failed_rounds == 0 {
                self.stats.waits.fetch_add(1, Ordering::Relaxed);
                debug!(%tid, %pid, %perm, "waiting for lock");
            }
            failed_rounds += 1;

            match Instant::now().checked_add(self.lock_wait) {
                Some(round_end) => {
                    while !table.is_compatible(tid, pid, perm) {
                        if self.released.wait_until(&mut table, round_end).timed_out() {
                            break;
                        }
                    }
                }
                // Round too long for an `Instant`: wait for releases only.
                None => {
                    while !table.is_compatible(tid, pid, perm) {
                        self.released.wait(&mut table);
                    }
                }
            }
        }
    }

    /// Grant the lock if it is compatible right now; never waits.
    pub fn try_acquire(&self, tid: TransactionId, pid: PageId, perm: Permission) -> bool {
        let mut table = self.table.lock();
        if !table.is_compatible(tid, pid, perm) {
            return false;
        }
        let grant = table.grant(tid, pid, perm);
        self.record_grant(grant);
        trace!(%tid, %pid, %perm, ?grant, "lock granted");
        true
    }

    /// Drop whatever lock `tid` holds on `pid`.
    ///
    /// Returns whether a lock was actually held.
    pub fn release(&self, tid: TransactionId, pid: PageId) -> bool {
        let removed = self.table.lock().release(tid, pid);
        if removed {
            self.stats.released.fetch_add(1, Ordering::Relaxed);
            self.released.notify_all();
            trace!(%tid, %pid, "lock released");
        }
        removed
    }

    /// Drop every lock `tid` holds. Returns how many were released.
    pub fn release_all(&self, tid: TransactionId) -> usize {
        let count = self.table.lock().release_all(tid);
        if count > 0 {
            self.stats.released.fetch_add(count as u64, Ordering::Relaxed);
            self.released.notify_all();
        }
        trace!(%tid, count, "released all locks");
        count
    }

    /// Does `tid` hold any lock on `pid`?
    pub fn holds(&self, tid: TransactionId, pid: PageId) -> bool {
        self.table.lock().mode(tid, pid).is_some()
    }

    /// The mode `tid` holds on `pid`, if any.
    pub fn lock_mode(&self, tid: TransactionId, pid: PageId) -> Option<Permission> {
        self.table.lock().mode(tid, pid)
    }

    /// Is `pid` locked by any transaction?
    pub fn is_locked(&self, pid: PageId) -> bool {
        self.table.lock().page_locks.contains_key(&pid)
    }

    /// Current holders of `pid`, ordered by transaction id.
    pub fn holders(&self, pid: PageId) -> Vec<(TransactionId, Permission)> {
        let table = self.table.lock();
        let mut holders: Vec<_> = table
            .page_locks
            .get(&pid)
            .map(|h| h.iter().map(|(&tid, &perm)| (tid, perm)).collect())
            .unwrap_or_default();
        holders.sort();
        holders
    }

    /// Pages `tid` has locked, in ascending order.
    pub fn locked_pages(&self, tid: TransactionId) -> Vec<PageId> {
        let table = self.table.lock();
        let mut pages: Vec<PageId> = table
            .txn_locks
            .get(&tid)
            .map(|p| p.iter().copied().collect())
            .unwrap_or_default();
        pages.sort();
        pages
    }

    pub fn stats(&self) -> &LockStats {
        &self.stats
    }

    /// Worst-case time a single `acquire` call can block, saturating at
    /// `Duration::MAX`.
    pub fn timeout(&self) -> Duration {
        self.lock_wait.saturating_mul(self.lock_retries)
    }

    fn record_grant(&self, grant: Grant) {
        self.stats.granted.fetch_add(1, Ordering::Relaxed);
        if grant == Grant::Upgrade {
            self.stats.upgrades.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT, DEFAULT_LOCK_RETRIES)
    }
}
