//! # Infra Lock (I: Foundation)
//!
//! Distributed mutual exclusion over the shared store. One lock per
//! (subject, tenant, resource) serialises expensive per-subject work
//! across every process that talks to the same store; the store's atomic
//! set-if-absent is the only synchronisation primitive and the TTL is the
//! only deadlock prevention.
//!
//! This crate provides:
//! - [`LockManager`]: acquire / release / `run_exclusive` with bounded
//!   exponential backoff and jitter
//! - [`LockHandle`]: token-bound proof of ownership
//! - [`LockStatsCollector`]: injected, resettable observability counters

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

mod config;
mod error;
mod manager;
mod stats;

pub use config::LockConfig;
pub use error::LockError;
pub use manager::{LockHandle, LockManager, DEFAULT_RESOURCE};
pub use stats::{LockStats, LockStatsCollector, HOLD_TIME_WINDOW};
