//! Cache-aside result store.
//!
//! Serialised result objects keyed per subject with a fixed TTL per
//! object kind. Reads degrade to a miss on any store or decode failure:
//! a broken cache costs a recomputation, never a failed request. Writes
//! that mutate source data must invalidate synchronously instead of
//! overwriting, so no caller can act on figures the mutation outdated.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use infra_store::{SharedStore, StoreError};
use risk_engine::{SubjectId, TenantId};

/// Cached object kinds with their fixed TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Full risk metrics snapshot; refreshed frequently.
    Metrics,
    /// Risk profile classification; changes slowly.
    Profile,
    /// Risk limit set; invalidated on every limit mutation.
    Limits,
    /// Value-at-Risk results.
    Var,
}

impl CacheKind {
    /// Fixed TTL for the kind. Entries never outlive it.
    pub fn ttl(&self) -> Duration {
        match self {
            Self::Metrics => Duration::from_secs(30),
            Self::Profile => Duration::from_secs(3_600),
            Self::Limits => Duration::from_secs(1_800),
            Self::Var => Duration::from_secs(60),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Profile => "profile",
            Self::Limits => "limits",
            Self::Var => "var",
        }
    }
}

/// Cache-aside layer over the shared store.
pub struct ResultCache<S: SharedStore> {
    store: Arc<S>,
}

impl<S: SharedStore> ResultCache<S> {
    /// Creates a cache over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Store key for one (kind, subject, tenant) entry.
    pub fn cache_key(kind: CacheKind, subject: &SubjectId, tenant: &TenantId) -> String {
        format!("risk:{}:{}:{}", kind.as_str(), tenant, subject)
    }

    /// Reads a cached value, degrading every failure to a miss.
    ///
    /// Store errors and malformed payloads are logged and reported as
    /// `None`; the caller recomputes.
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: CacheKind,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Option<T> {
        let key = Self::cache_key(kind, subject, tenant);
        let raw = match self.store.get(&key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key = %key, error = %err, "cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %key, error = %err, "malformed cache payload, treating as miss");
                None
            }
        }
    }

    /// Writes a value under its kind's fixed TTL, overwriting any
    /// existing entry and re-applying the TTL.
    pub async fn put<T: Serialize>(
        &self,
        kind: CacheKind,
        subject: &SubjectId,
        tenant: &TenantId,
        value: &T,
    ) -> Result<(), StoreError> {
        let key = Self::cache_key(kind, subject, tenant);
        let payload = serde_json::to_string(value)
            .map_err(|e| StoreError::backend(format!("serialize {}: {}", key, e)))?;
        self.store.put(&key, &payload, kind.ttl()).await?;
        debug!(key = %key, ttl_secs = kind.ttl().as_secs(), "cache write");
        Ok(())
    }

    /// Removes one entry. Must be called synchronously by any write path
    /// that mutates the kind's source data, before that path reports
    /// success.
    pub async fn invalidate(
        &self,
        kind: CacheKind,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<(), StoreError> {
        let key = Self::cache_key(kind, subject, tenant);
        self.store.delete(&key).await?;
        debug!(key = %key, "cache invalidated");
        Ok(())
    }

    /// Best-effort removal of every kind for one subject. Returns the
    /// number of entries deleted; individual failures are logged and
    /// skipped.
    pub async fn invalidate_all(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<usize, StoreError> {
        let pattern = format!("risk:*:{}:{}", tenant, subject);
        let keys = self.store.scan(&pattern).await?;
        let mut deleted = 0;
        for key in keys {
            match self.store.delete(&key).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(err) => warn!(key = %key, error = %err, "invalidate skipped"),
            }
        }
        Ok(deleted)
    }

    /// Best-effort [`invalidate_all`](Self::invalidate_all) across many
    /// subjects of one tenant.
    pub async fn batch_invalidate(
        &self,
        subjects: &[SubjectId],
        tenant: &TenantId,
    ) -> usize {
        let mut deleted = 0;
        for subject in subjects {
            match self.invalidate_all(subject, tenant).await {
                Ok(n) => deleted += n,
                Err(err) => {
                    warn!(subject = %subject, error = %err, "batch invalidate skipped subject");
                }
            }
        }
        deleted
    }
}
