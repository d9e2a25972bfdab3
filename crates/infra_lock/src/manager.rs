//! Distributed lock manager.
//!
//! Serialises expensive per-subject work across processes using the
//! shared store's atomic set-if-absent as the sole synchronisation
//! primitive. Locks are TTL-bounded; expiry is enforced by the store and
//! is the only deadlock-prevention mechanism.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, warn};
use uuid::Uuid;

use infra_store::SharedStore;

use crate::config::LockConfig;
use crate::error::LockError;
use crate::stats::LockStatsCollector;

/// Resource name used when callers do not specify one.
pub const DEFAULT_RESOURCE: &str = "metrics";

/// Proof of a successfully acquired lock.
///
/// Holds the opaque token written to the store; release succeeds only
/// when the stored value still equals this token, so a holder whose lock
/// expired and was re-acquired elsewhere cannot destroy the new holder's
/// lock.
#[derive(Debug, Clone)]
pub struct LockHandle {
    key: String,
    token: String,
    acquired_at: Instant,
    ttl: Duration,
}

impl LockHandle {
    /// The store key the lock lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The owner token presented on release.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// TTL the lock was acquired with.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// How long the lock has been held.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

/// TTL-bounded exclusive locks per (subject, tenant, resource).
///
/// Acquisition writes a fresh token with the store's atomic
/// set-if-absent, re-reads the key, and treats any mismatch as failure;
/// failed attempts retry with exponential backoff plus symmetric jitter
/// up to a fixed attempt budget.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use infra_lock::{LockConfig, LockManager, LockStatsCollector};
/// use infra_store::MemoryStore;
///
/// # tokio_test::block_on(async {
/// let manager = LockManager::new(
///     Arc::new(MemoryStore::new()),
///     LockConfig::default(),
///     Arc::new(LockStatsCollector::new()),
/// );
///
/// let handle = manager.acquire("acct-1", "t1", "metrics").await.unwrap();
/// assert!(manager.is_locked("acct-1", "t1", "metrics").await.unwrap());
/// assert!(manager.release(&handle).await.unwrap());
/// # });
/// ```
pub struct LockManager<S: SharedStore> {
    store: Arc<S>,
    config: LockConfig,
    stats: Arc<LockStatsCollector>,
}

impl<S: SharedStore> LockManager<S> {
    /// Creates a manager over the given store with an injected stats
    /// collector.
    pub fn new(store: Arc<S>, config: LockConfig, stats: Arc<LockStatsCollector>) -> Self {
        Self {
            store,
            config,
            stats,
        }
    }

    /// Returns the injected stats collector.
    pub fn stats(&self) -> &Arc<LockStatsCollector> {
        &self.stats
    }

    /// Store key for a (subject, tenant, resource) scope.
    pub fn lock_key(subject: &str, tenant: &str, resource: &str) -> String {
        format!("lock:{}:{}:{}", tenant, subject, resource)
    }

    /// Acquires the lock with the configured TTL.
    ///
    /// # Errors
    ///
    /// - [`LockError::Unavailable`] once every attempt found the lock held
    /// - [`LockError::Store`] if the shared store fails
    pub async fn acquire(
        &self,
        subject: &str,
        tenant: &str,
        resource: &str,
    ) -> Result<LockHandle, LockError> {
        self.acquire_with_ttl(subject, tenant, resource, self.config.ttl)
            .await
    }

    /// Acquires the lock with an explicit TTL.
    pub async fn acquire_with_ttl(
        &self,
        subject: &str,
        tenant: &str,
        resource: &str,
        ttl: Duration,
    ) -> Result<LockHandle, LockError> {
        let key = Self::lock_key(subject, tenant, resource);
        let token = Uuid::new_v4().to_string();

        for attempt in 0..self.config.max_attempts {
            if self.try_write(&key, &token, ttl).await? {
                self.stats.record_acquired();
                debug!(key = %key, attempt, "lock acquired");
                return Ok(LockHandle {
                    key,
                    token,
                    acquired_at: Instant::now(),
                    ttl,
                });
            }
            // Do not sleep after the final attempt.
            if attempt + 1 < self.config.max_attempts {
                tokio::time::sleep(self.jittered_delay(attempt)).await;
            }
        }

        self.stats.record_failed();
        warn!(key = %key, attempts = self.config.max_attempts, "lock unavailable");
        Err(LockError::Unavailable {
            subject: subject.to_string(),
            resource: resource.to_string(),
            attempts: self.config.max_attempts,
        })
    }

    /// One atomic write attempt with read-back verification. A mismatch
    /// between the re-read value and the token counts as failure; it
    /// means the store raced or lost the write.
    async fn try_write(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, LockError> {
        if !self.store.set_if_absent(key, token, ttl).await? {
            return Ok(false);
        }
        match self.store.get(key).await? {
            Some(stored) if stored == token => Ok(true),
            _ => Ok(false),
        }
    }

    fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.config.backoff_delay(attempt).as_secs_f64();
        let jitter_bound = delay * self.config.jitter_fraction;
        let jitter = if jitter_bound > 0.0 {
            rand::thread_rng().gen_range(-jitter_bound..=jitter_bound)
        } else {
            0.0
        };
        Duration::from_secs_f64((delay + jitter).max(0.0))
    }

    /// Releases the lock if the stored token still matches the handle's.
    ///
    /// Returns `false` without touching the key when the token differs or
    /// the lock already expired.
    pub async fn release(&self, handle: &LockHandle) -> Result<bool, LockError> {
        let released = self
            .release_token(&handle.key, &handle.token)
            .await?;
        if released {
            self.stats.record_released(handle.held_for());
        }
        Ok(released)
    }

    async fn release_token(&self, key: &str, token: &str) -> Result<bool, LockError> {
        match self.store.get(key).await? {
            Some(stored) if stored == token => Ok(self.store.delete(key).await?),
            Some(_) => {
                warn!(key = %key, "release refused: token mismatch");
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Whether the lock is currently held by anyone.
    pub async fn is_locked(
        &self,
        subject: &str,
        tenant: &str,
        resource: &str,
    ) -> Result<bool, LockError> {
        let key = Self::lock_key(subject, tenant, resource);
        Ok(self.store.get(&key).await?.is_some())
    }

    /// Unconditionally deletes the lock key, ignoring ownership.
    ///
    /// Emergency use only: this can destroy a live holder's lock.
    pub async fn force_release(
        &self,
        subject: &str,
        tenant: &str,
        resource: &str,
    ) -> Result<bool, LockError> {
        let key = Self::lock_key(subject, tenant, resource);
        warn!(key = %key, "force-releasing lock");
        Ok(self.store.delete(&key).await?)
    }

    /// Acquires the lock, runs `f`, and releases in all outcomes.
    ///
    /// The closure's own failure is re-raised as the inner `Result` after
    /// the release, never masked as a lock failure. The outer `Result`
    /// carries lock-layer errors only.
    pub async fn run_exclusive<T, E, F, Fut>(
        &self,
        subject: &str,
        tenant: &str,
        resource: &str,
        f: F,
    ) -> Result<Result<T, E>, LockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let handle = self.acquire(subject, tenant, resource).await?;
        let outcome = f().await;
        // Release before surfacing the closure's outcome. A release
        // failure is logged, not raised: the TTL will reap the key and
        // the closure's result matters more to the caller.
        if let Err(release_err) = self.release(&handle).await {
            warn!(key = %handle.key(), error = %release_err, "release failed after run");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infra_store::MemoryStore;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn manager(config: LockConfig) -> LockManager<MemoryStore> {
        LockManager::new(
            Arc::new(MemoryStore::new()),
            config,
            Arc::new(LockStatsCollector::new()),
        )
    }

    fn fast_config() -> LockConfig {
        LockConfig {
            ttl: Duration::from_secs(5),
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            jitter_fraction: 0.25,
        }
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let manager = manager(fast_config());
        let handle = manager.acquire("u1", "t1", "metrics").await.unwrap();
        assert!(manager.is_locked("u1", "t1", "metrics").await.unwrap());
        assert!(manager.release(&handle).await.unwrap());
        assert!(!manager.is_locked("u1", "t1", "metrics").await.unwrap());

        let stats = manager.stats().snapshot();
        assert_eq!(stats.acquired, 1);
        assert_eq!(stats.released, 1);
    }

    #[tokio::test]
    async fn test_contended_acquire_exhausts_attempts() {
        let manager = manager(fast_config());
        let _held = manager.acquire("u1", "t1", "metrics").await.unwrap();

        let err = manager.acquire("u1", "t1", "metrics").await.unwrap_err();
        assert_eq!(
            err,
            LockError::Unavailable {
                subject: "u1".to_string(),
                resource: "metrics".to_string(),
                attempts: 3,
            }
        );
        assert_eq!(manager.stats().snapshot().failed, 1);
    }

    #[tokio::test]
    async fn test_independent_resources_do_not_contend() {
        let manager = manager(fast_config());
        let _metrics = manager.acquire("u1", "t1", "metrics").await.unwrap();
        // Same subject, different resource: acquires immediately.
        let profile = manager.acquire("u1", "t1", "profile").await;
        assert!(profile.is_ok());
        // Different subject, same resource: also fine.
        assert!(manager.acquire("u2", "t1", "metrics").await.is_ok());
    }

    #[tokio::test]
    async fn test_release_with_foreign_token_is_a_no_op() {
        let manager = manager(fast_config());
        let real = manager.acquire("u1", "t1", "metrics").await.unwrap();

        let forged = LockHandle {
            key: real.key().to_string(),
            token: Uuid::new_v4().to_string(),
            acquired_at: Instant::now(),
            ttl: real.ttl(),
        };
        assert!(!manager.release(&forged).await.unwrap());
        assert!(manager.is_locked("u1", "t1", "metrics").await.unwrap());

        // The true holder can still release.
        assert!(manager.release(&real).await.unwrap());
    }

    #[tokio::test]
    async fn test_ttl_expiry_self_heals() {
        let manager = manager(LockConfig {
            ttl: Duration::from_millis(100),
            ..fast_config()
        });
        let stale = manager.acquire("u1", "t1", "metrics").await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(!manager.is_locked("u1", "t1", "metrics").await.unwrap());
        let fresh = manager.acquire("u1", "t1", "metrics").await.unwrap();

        // The stale handle cannot release the new holder's lock.
        assert!(!manager.release(&stale).await.unwrap());
        assert!(manager.release(&fresh).await.unwrap());
    }

    #[tokio::test]
    async fn test_force_release_ignores_ownership() {
        let manager = manager(fast_config());
        let _held = manager.acquire("u1", "t1", "metrics").await.unwrap();
        assert!(manager.force_release("u1", "t1", "metrics").await.unwrap());
        assert!(!manager.is_locked("u1", "t1", "metrics").await.unwrap());
        assert!(!manager.force_release("u1", "t1", "metrics").await.unwrap());
    }

    #[tokio::test]
    async fn test_run_exclusive_serialises_critical_sections() {
        let manager = Arc::new(LockManager::new(
            Arc::new(MemoryStore::new()),
            LockConfig {
                ttl: Duration::from_secs(5),
                max_attempts: 50,
                base_delay: Duration::from_millis(5),
                jitter_fraction: 0.25,
            },
            Arc::new(LockStatsCollector::new()),
        ));
        let counter = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicBool::new(false));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            let counter = Arc::clone(&counter);
            let in_flight = Arc::clone(&in_flight);
            tasks.push(tokio::spawn(async move {
                manager
                    .run_exclusive("u1", "t1", "metrics", || async {
                        // Fails the test if two sections ever overlap.
                        assert!(!in_flight.swap(true, Ordering::SeqCst));
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        in_flight.store(false, Ordering::SeqCst);
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, std::convert::Infallible>(())
                    })
                    .await
                    .unwrap()
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 8);
        let stats = manager.stats().snapshot();
        assert_eq!(stats.acquired, 8);
        assert_eq!(stats.released, 8);
        assert!(stats.avg_hold_time >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_run_exclusive_releases_on_closure_error() {
        let manager = manager(fast_config());
        let outcome: Result<(), &str> = manager
            .run_exclusive("u1", "t1", "metrics", || async { Err("compute failed") })
            .await
            .unwrap();
        assert_eq!(outcome, Err("compute failed"));
        // The closure's failure must not leak the lock.
        assert!(!manager.is_locked("u1", "t1", "metrics").await.unwrap());
    }
}
