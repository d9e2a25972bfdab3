//! # Risk Engine (R: Kernel)
//!
//! Pure portfolio risk analytics over externally supplied snapshots.
//! No I/O, no clocks, no hidden randomness: positions, wallet figures,
//! value history, and the random source are all injected, so every
//! computation is reproducible.
//!
//! This crate provides:
//! - Exposure, leverage, and Herfindahl concentration aggregation
//! - Drawdown analysis over a time-ordered value history
//! - Historical and parametric Value-at-Risk with expected shortfall
//! - Monte Carlo factor simulation with antithetic variates
//! - Sharpe, Sortino, and Calmar performance ratios
//! - The overall 0-100 risk score and derived risk level
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             risk_engine (R)             │
//! ├─────────────────────────────────────────┤
//! │  types/     - ids, positions, snapshot  │
//! │  exposure   - long/short/net/gross      │
//! │  drawdown   - running-peak analysis     │
//! │  var/       - historical + parametric   │
//! │  mc/        - factor simulation         │
//! │  ratios     - Sharpe/Sortino/Calmar     │
//! │  score      - bounded weighted score    │
//! │  engine     - snapshot assembly         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use risk_engine::engine::{compute_snapshot, SnapshotInputs};
//! use risk_engine::types::{PositionSide, PositionSnapshot, SubjectId, TenantId};
//!
//! let inputs = SnapshotInputs {
//!     subject: SubjectId::new("acct-42"),
//!     tenant: TenantId::new("desk-eu"),
//!     positions: vec![PositionSnapshot::new(
//!         PositionSide::Long,
//!         101.5,
//!         200.0,
//!         300.0,
//!         0.0,
//!     )],
//!     cash_balance: 40_000.0,
//!     margin_available: 10_000.0,
//!     value_history: Vec::new(),
//!     daily_returns: Vec::new(),
//!     risk_free_rate: 0.04,
//! };
//!
//! let snapshot = compute_snapshot(&inputs, Utc::now()).unwrap();
//! assert!(snapshot.overall_risk_score <= 100.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod drawdown;
pub mod engine;
pub mod exposure;
pub mod math;
pub mod mc;
pub mod ratios;
pub mod score;
pub mod types;
pub mod var;

// Re-export commonly used types
pub use drawdown::{compute_drawdown, ValuePoint};
pub use engine::{compute_snapshot, daily_returns_from_values, SnapshotInputs};
pub use mc::{
    FactorDistribution, FactorExposure, MonteCarloConfig, MonteCarloEngine, MonteCarloVarResult,
    RandomSource, RiskFactorModel, StdRandomSource,
};
pub use ratios::{compute_ratios, PerformanceRatios};
pub use score::overall_risk_score;
pub use types::{
    DrawdownStats, ExposureBreakdown, PositionSide, PositionSnapshot, RiskError, RiskLevel,
    RiskMetricsSnapshot, SubjectId, TenantId,
};
pub use var::{historical_var, parametric_var, VarMethod, VarParams, VarResult, MIN_OBSERVATIONS};
