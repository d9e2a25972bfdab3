//! # Service Metrics (S: Output)
//!
//! Orchestration layer over the risk kernel: cache-aside result storage,
//! per-subject distributed locking, collaborator glue, limits, and
//! profiles.
//!
//! The control flow per request is fixed:
//!
//! ```text
//! caller -> cache check -> [hit: return]
//!        -> lock acquire -> cache re-check -> compute
//!        -> cache write -> lock release -> return
//! ```
//!
//! Concurrent duplicate computation for the same subject is never
//! acceptable; if the lock cannot be acquired the caller receives a
//! typed retry-later error instead of an unprotected computation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod cache;
pub mod config;
pub mod error;
pub mod limits;
pub mod orchestrator;
pub mod profile;
pub mod providers;

// Re-export commonly used types
pub use cache::{CacheKind, ResultCache};
pub use config::{ConfigError, RiskServiceConfig};
pub use error::MetricsError;
pub use limits::{evaluate_limits, LimitKind, LimitViolation, LimitsProvider, RiskLimit};
pub use orchestrator::{
    Collaborators, RiskMetricsService, RESOURCE_MONTE_CARLO, RESOURCE_PROFILE, RESOURCE_VAR,
};
pub use profile::{build_profile, RiskProfile, RiskTolerance};
pub use providers::{
    NotificationSink, PositionProvider, ProviderError, RiskEvent, RiskEventKind,
    RiskFreeRateProvider, SnapshotHistory, WalletProvider,
};
