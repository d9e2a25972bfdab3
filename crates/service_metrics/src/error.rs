//! Error taxonomy for the metrics service.

use thiserror::Error;

use infra_lock::LockError;
use infra_store::StoreError;
use risk_engine::RiskError;

/// Service-level errors surfaced to callers.
///
/// The caller always receives either a complete, internally consistent
/// result or one of these typed failures; never a partially populated
/// snapshot.
///
/// # Variants
/// - `LockUnavailable`: contention, retry later; not a data error
/// - `InsufficientData`: not enough history; wait for more, no fallback
/// - `Upstream`: a collaborator failed after degradation was not possible
/// - `Computation`: unexpected numeric fault, nothing was cached
/// - `Store`: shared store failure outside the degradable cache path
/// - `Config`: invalid service configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// The subject's computation lock could not be acquired in time.
    #[error("risk computation busy for {subject}/{resource}, retry shortly")]
    LockUnavailable {
        /// Subject whose lock was contended.
        subject: String,
        /// Contended resource name.
        resource: String,
    },

    /// Not enough historical observations for the requested statistic.
    #[error("insufficient data: got {got} observations, need at least {need}")]
    InsufficientData {
        /// Number of observations available.
        got: usize,
        /// Minimum required observations.
        need: usize,
    },

    /// A collaborator could not be reached.
    #[error("{provider} provider unavailable: {message}")]
    Upstream {
        /// Collaborator name.
        provider: String,
        /// Failure description.
        message: String,
    },

    /// The risk engine produced an unexpected fault.
    #[error("computation error: {0}")]
    Computation(String),

    /// The shared store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid service configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MetricsError {
    /// Whether the caller should simply retry later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockUnavailable { .. })
    }
}

impl From<LockError> for MetricsError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Unavailable {
                subject, resource, ..
            } => Self::LockUnavailable { subject, resource },
            LockError::Store(store) => Self::Store(store),
        }
    }
}

impl From<RiskError> for MetricsError {
    fn from(err: RiskError) -> Self {
        match err {
            RiskError::InsufficientData { got, need } => Self::InsufficientData { got, need },
            other => Self::Computation(other.to_string()),
        }
    }
}
