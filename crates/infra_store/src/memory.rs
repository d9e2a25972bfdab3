//! In-process store adapter.
//!
//! A `Mutex`-guarded map with `Instant`-based expiry. Expired entries are
//! purged lazily on access; the check-and-insert of
//! [`set_if_absent`](SharedStore::set_if_absent) happens under a single
//! lock hold, which is what makes it atomic against every other task in
//! the process.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::{glob_match, SharedStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory [`SharedStore`] implementation.
///
/// Used directly in tests and single-process deployments; the
/// multi-process guarantee comes from swapping in a server-backed adapter
/// with the same trait contract.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use infra_store::{MemoryStore, SharedStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// let ttl = Duration::from_secs(30);
///
/// assert!(store.set_if_absent("k", "a", ttl).await.unwrap());
/// assert!(!store.set_if_absent("k", "b", ttl).await.unwrap());
/// assert_eq!(store.get("k").await.unwrap(), Some("a".to_string()));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().expect("store mutex poisoned");
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Whether the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        match entries.get(key) {
            Some(existing) if !existing.is_expired(now) => Ok(false),
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: value.to_string(),
                        expires_at: now + ttl,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        match entries.remove(key) {
            Some(entry) => Ok(!entry.is_expired(now)),
            None => Ok(false),
        }
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        entries.retain(|_, entry| !entry.is_expired(now));
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
