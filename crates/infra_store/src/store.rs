//! The shared store trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Thin interface over a single external key-value store.
///
/// This is the only shared mutable resource in the system; the lock
/// manager and the result cache are its only callers. Correctness of
/// cross-process mutual exclusion rests entirely on
/// [`set_if_absent`](SharedStore::set_if_absent) being atomic against all
/// other processes.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Atomically stores `value` under `key` with the given TTL, only if
    /// the key is currently absent. Returns `true` if the write happened.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Stores `value` under `key` with the given TTL, overwriting any
    /// existing entry.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Returns the value under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Deletes `key`. Returns `true` if an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Returns all live keys matching a glob pattern (`*` wildcards).
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError>;
}

/// Glob match supporting `*` wildcards only.
///
/// Shared by in-process adapters; server-side backends (Redis `KEYS`)
/// match natively.
pub(crate) fn glob_match(pattern: &str, key: &str) -> bool {
    fn inner(p: &[u8], k: &[u8]) -> bool {
        match (p.first(), k.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                inner(&p[1..], k) || (!k.is_empty() && inner(p, &k[1..]))
            }
            (Some(pc), Some(kc)) if pc == kc => inner(&p[1..], &k[1..]),
            _ => false,
        }
    }
    inner(pattern.as_bytes(), key.as_bytes())
}
