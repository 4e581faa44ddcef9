//! Per-division write locks with bounded waits.
//!
//! Every writer of a division holds that division's lock for its whole
//! read-compute-commit sequence. Waiting is bounded: each attempt times out,
//! retries back off, and the caller finally gets a
//! `ConcurrentModification` error instead of blocking forever.

use crate::bracket::models::DivisionId;
use crate::config::BracketConfig;
use crate::errors::{BracketError, BracketResult};
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{Mutex, OwnedMutexGuard, RwLock},
    time::{sleep, timeout},
};

/// Guard proving exclusive write access to one division
pub struct DivisionGuard {
    division: DivisionId,
    _guard: OwnedMutexGuard<()>,
}

impl DivisionGuard {
    pub fn division(&self) -> DivisionId {
        self.division
    }
}

impl Drop for DivisionGuard {
    fn drop(&mut self) {
        log::debug!("Released lock on division {}", self.division);
    }
}

/// Registry of division locks
#[derive(Clone, Default)]
pub struct DivisionLocks {
    locks: Arc<RwLock<HashMap<DivisionId, Arc<Mutex<()>>>>>,
}

impl DivisionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, division: DivisionId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(&division) {
            return lock.clone();
        }
        let mut locks = self.locks.write().await;
        // Entries only the registry still references are idle
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(division).or_default().clone()
    }

    /// Number of divisions currently tracked
    pub async fn tracked(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Acquire the lock of a division
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` once `lock_retry_attempts` attempts
    /// of `lock_timeout` each have failed.
    pub async fn acquire(
        &self,
        division: DivisionId,
        config: &BracketConfig,
    ) -> BracketResult<DivisionGuard> {
        let lock = self.lock_for(division).await;
        let attempts = config.lock_retry_attempts.max(1);

        for attempt in 1..=attempts {
            if let Ok(guard) = timeout(config.lock_timeout(), lock.clone().lock_owned()).await {
                log::debug!(
                    "Acquired lock on division {} (attempt {})",
                    division,
                    attempt
                );
                return Ok(DivisionGuard {
                    division,
                    _guard: guard,
                });
            }

            log::warn!(
                "Division {} is busy (attempt {}/{})",
                division,
                attempt,
                attempts
            );
            if attempt < attempts {
                sleep(config.retry_backoff(attempt)).await;
            }
        }

        Err(BracketError::ConcurrentModification { division, attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> BracketConfig {
        BracketConfig {
            lock_timeout_ms: 20,
            lock_retry_attempts: 2,
            lock_retry_backoff_ms: 5,
            ..BracketConfig::default()
        }
    }

    #[tokio::test]
    async fn test_acquire_free_lock() {
        let locks = DivisionLocks::new();
        let guard = locks.acquire(1, &quick_config()).await.unwrap();
        assert_eq!(guard.division(), 1);
    }

    #[tokio::test]
    async fn test_held_lock_times_out() {
        let locks = DivisionLocks::new();
        let _held = locks.acquire(1, &quick_config()).await.unwrap();

        match locks.acquire(1, &quick_config()).await {
            Err(BracketError::ConcurrentModification { division, attempts }) => {
                assert_eq!(division, 1);
                assert_eq!(attempts, 2);
            }
            other => panic!("expected ConcurrentModification, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_divisions_are_independent() {
        let locks = DivisionLocks::new();
        let _held = locks.acquire(1, &quick_config()).await.unwrap();
        assert!(locks.acquire(2, &quick_config()).await.is_ok());
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let locks = DivisionLocks::new();
        {
            let _held = locks.acquire(1, &quick_config()).await.unwrap();
        }
        assert!(locks.acquire(1, &quick_config()).await.is_ok());
    }

    #[tokio::test]
    async fn test_idle_locks_are_pruned() {
        let locks = DivisionLocks::new();
        for division in 1..=50 {
            let _guard = locks.acquire(division, &quick_config()).await.unwrap();
        }
        assert_eq!(locks.tracked().await, 1);
    }

    #[tokio::test]
    async fn test_held_lock_survives_pruning() {
        let locks = DivisionLocks::new();
        let _held = locks.acquire(1, &quick_config()).await.unwrap();
        let _other = locks.acquire(2, &quick_config()).await.unwrap();
        assert_eq!(locks.tracked().await, 2);

        // Division 1 is still exclusive
        assert!(matches!(
            locks.acquire(1, &quick_config()).await.err(),
            Some(BracketError::ConcurrentModification { division: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_waiter_gets_lock_after_release() {
        let locks = DivisionLocks::new();
        let config = BracketConfig {
            lock_timeout_ms: 500,
            ..quick_config()
        };
        let held = locks.acquire(1, &config).await.unwrap();

        let waiter = {
            let locks = locks.clone();
            let config = config.clone();
            tokio::spawn(async move { locks.acquire(1, &config).await.map(|g| g.division()) })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        drop(held);

        assert_eq!(waiter.await.unwrap().unwrap(), 1);
    }
}
