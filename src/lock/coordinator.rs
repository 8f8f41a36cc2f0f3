//! Per-key mutual exclusion with lease expiry
//!
//! The coordinator serializes balance mutations per account number: at most
//! one holder per key at any instant, across all concurrent tasks. Acquisition
//! blocks up to a wait timeout and then fails; it is never retried silently.
//! A held lock carries a lease (`hold_timeout`) after which it may be taken
//! over, so a holder that crashes without releasing cannot block a key
//! forever. Past the lease boundary a holder's lock is advisory only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::types::LedgerError;

/// Interval between acquisition attempts while waiting for a contended key
const ACQUIRE_RETRY_INTERVAL: Duration = Duration::from_millis(20);

/// Interval between background sweeps of expired entries
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Wait/lease timeouts for guarded operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockConfig {
    /// How long an acquirer blocks on a held key before failing
    pub wait_timeout: Duration,
    /// Lease duration: how long a holder keeps the key before takeover is
    /// allowed
    pub hold_timeout: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(5),
            hold_timeout: Duration::from_secs(5),
        }
    }
}

/// A held lock entry in the coordinator's table
#[derive(Debug)]
struct LockEntry {
    /// Fencing token distinguishing this acquisition from any other
    token: u64,
    acquired_at: Instant,
    lease: Duration,
}

impl LockEntry {
    fn is_expired(&self) -> bool {
        self.acquired_at.elapsed() > self.lease
    }
}

/// Handle to a held lock
///
/// Releasing is idempotent: the entry is removed only while this guard's
/// fencing token still matches, so releasing twice, or releasing after the
/// lease expired and another acquirer took over, is a no-op. Dropping the
/// guard releases, which covers every exit path including unwind.
#[derive(Debug)]
pub struct LockGuard {
    locks: Arc<DashMap<String, LockEntry>>,
    key: String,
    token: u64,
}

impl LockGuard {
    /// The key this guard holds.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Release the lock if this guard still owns it.
    pub fn release(&self) {
        let removed = self
            .locks
            .remove_if(&self.key, |_, entry| entry.token == self.token)
            .is_some();
        if removed {
            debug!(key = %self.key, "lock released");
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Per-key exclusive lock coordinator
///
/// Backed by a `DashMap` keyed by account number; entry-level shard locking
/// makes each acquisition attempt atomic per key. Unrelated keys never
/// contend.
#[derive(Debug, Clone, Default)]
pub struct LockCoordinator {
    locks: Arc<DashMap<String, LockEntry>>,
    next_token: Arc<AtomicU64>,
}

impl LockCoordinator {
    /// Create a coordinator with an empty lock table.
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            next_token: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Attempt one acquisition without waiting.
    ///
    /// Succeeds when the key is free or its current entry's lease has
    /// expired (takeover).
    pub fn try_acquire(&self, key: &str, hold_timeout: Duration) -> Option<LockGuard> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let fresh = || LockEntry {
            token,
            acquired_at: Instant::now(),
            lease: hold_timeout,
        };

        // The entry API makes the check-and-claim atomic per key: an
        // occupied entry is claimed only when its lease has expired.
        let mut acquired = false;
        self.locks
            .entry(key.to_string())
            .and_modify(|entry| {
                if entry.is_expired() {
                    warn!(key = %key, "lock lease expired, taking over");
                    *entry = fresh();
                    acquired = true;
                }
            })
            .or_insert_with(|| {
                acquired = true;
                fresh()
            });

        if !acquired {
            return None;
        }

        debug!(key = %key, "lock acquired");
        Some(LockGuard {
            locks: Arc::clone(&self.locks),
            key: key.to_string(),
            token,
        })
    }

    /// Acquire the lock for `key`, waiting up to `wait_timeout`.
    ///
    /// Fails with [`LedgerError::LockUnavailable`] once the wait window
    /// elapses; the caller decides whether to retry.
    pub async fn acquire(
        &self,
        key: &str,
        wait_timeout: Duration,
        hold_timeout: Duration,
    ) -> Result<LockGuard, LedgerError> {
        let deadline = Instant::now() + wait_timeout;
        loop {
            if let Some(guard) = self.try_acquire(key, hold_timeout) {
                return Ok(guard);
            }
            let now = Instant::now();
            if now >= deadline {
                debug!(key = %key, "lock wait window elapsed");
                return Err(LedgerError::lock_unavailable(key));
            }
            tokio::time::sleep(ACQUIRE_RETRY_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Start the background task evicting expired entries.
    ///
    /// Expired entries are also taken over lazily on acquire; the sweeper
    /// only keeps the table from accumulating keys that are never locked
    /// again. Must be called from within a tokio runtime, explicitly, as
    /// part of process startup.
    pub fn start_expiry_sweeper(&self) {
        let locks = Arc::clone(&self.locks);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let before = locks.len();
                locks.retain(|_, entry| !entry.is_expired());
                // Concurrent inserts during the sweep can make len grow.
                let evicted = before.saturating_sub(locks.len());
                if evicted > 0 {
                    debug!(count = evicted, "evicted expired lock entries");
                }
            }
        });
    }

    /// Number of currently tracked lock entries (held or not yet swept).
    pub fn held_count(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(100);
    const HOLD: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_acquire_and_release() {
        let coordinator = LockCoordinator::new();

        let guard = coordinator.acquire("1000000000", WAIT, HOLD).await.unwrap();
        assert_eq!(guard.key(), "1000000000");
        assert_eq!(coordinator.held_count(), 1);

        guard.release();
        assert_eq!(coordinator.held_count(), 0);
    }

    #[tokio::test]
    async fn test_held_key_fails_after_wait_window() {
        let coordinator = LockCoordinator::new();
        let _guard = coordinator.acquire("1000000000", WAIT, HOLD).await.unwrap();

        let err = coordinator
            .acquire("1000000000", Duration::from_millis(60), HOLD)
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::lock_unavailable("1000000000"));
    }

    #[tokio::test]
    async fn test_unrelated_keys_do_not_contend() {
        let coordinator = LockCoordinator::new();
        let _a = coordinator.acquire("1000000000", WAIT, HOLD).await.unwrap();
        let b = coordinator.acquire("1000000001", WAIT, HOLD).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let coordinator = LockCoordinator::new();
        let guard = coordinator.acquire("1000000000", WAIT, HOLD).await.unwrap();

        guard.release();
        guard.release();
        drop(guard);
        assert_eq!(coordinator.held_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_lease_allows_takeover() {
        let coordinator = LockCoordinator::new();
        let stale = coordinator
            .acquire("1000000000", WAIT, Duration::from_millis(0))
            .await
            .unwrap();

        // Lease of zero is immediately expired; a second acquirer takes over.
        let fresh = coordinator.acquire("1000000000", WAIT, HOLD).await;
        assert!(fresh.is_ok());

        // The stale holder's release must not evict the new holder.
        stale.release();
        assert_eq!(coordinator.held_count(), 1);
    }

    #[tokio::test]
    async fn test_waiting_acquirer_proceeds_after_release() {
        let coordinator = LockCoordinator::new();
        let guard = coordinator.acquire("1000000000", WAIT, HOLD).await.unwrap();

        let contender = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .acquire("1000000000", Duration::from_secs(2), HOLD)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        guard.release();

        assert!(contender.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_drop_releases_on_every_exit_path() {
        let coordinator = LockCoordinator::new();
        {
            let _guard = coordinator.acquire("1000000000", WAIT, HOLD).await.unwrap();
        }
        assert_eq!(coordinator.held_count(), 0);
    }

    #[tokio::test]
    async fn test_mutual_exclusion_at_most_one_holder() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let coordinator = LockCoordinator::new();
        let in_section = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..8 {
            let coordinator = coordinator.clone();
            let in_section = Arc::clone(&in_section);
            handles.push(tokio::spawn(async move {
                let guard = coordinator
                    .acquire("1000000000", Duration::from_secs(5), HOLD)
                    .await
                    .unwrap();
                let concurrent = in_section.fetch_add(1, Ordering::SeqCst);
                assert_eq!(concurrent, 0, "second holder inside critical section");
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_section.fetch_sub(1, Ordering::SeqCst);
                guard.release();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }
}
