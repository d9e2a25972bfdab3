//! Error types for lock management.

use thiserror::Error;

use infra_store::StoreError;

/// Lock acquisition and release errors.
///
/// `Unavailable` is a retry-later condition, not a data error: every
/// acquisition attempt was beaten by another holder. Store failures pass
/// through so callers can distinguish contention from infrastructure
/// trouble.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LockError {
    /// All acquisition attempts were exhausted while the lock stayed held.
    #[error("lock unavailable for {subject}/{resource} after {attempts} attempts")]
    Unavailable {
        /// Subject the lock is scoped to.
        subject: String,
        /// Resource name within the subject scope.
        resource: String,
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// The shared store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LockError {
    /// Whether the error is contention (retry later) rather than failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
