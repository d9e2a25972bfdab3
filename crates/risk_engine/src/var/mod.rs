//! Value-at-Risk estimation.
//!
//! Two estimators over a daily-return series: empirical ([`historical`])
//! and normal-approximation ([`parametric`]). Both scale the one-day figure
//! by the square-root-of-time rule and refuse to produce a number from
//! fewer than [`MIN_OBSERVATIONS`] returns.

mod historical;
mod parametric;

pub use historical::historical_var;
pub use parametric::{parametric_var, z_score};

use serde::{Deserialize, Serialize};

/// Minimum daily-return observations for VaR and performance ratios.
pub const MIN_OBSERVATIONS: usize = 30;

/// VaR estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarMethod {
    /// Empirical quantile of the observed return distribution.
    Historical,
    /// Normal approximation from the sample mean and deviation.
    Parametric,
    /// Factor simulation; see [`crate::mc`].
    MonteCarlo,
}

/// Parameters for a VaR request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarParams {
    /// Confidence level in (0, 1), e.g. 0.95.
    pub confidence: f64,
    /// Time horizon in days; the one-day figure scales by its square root.
    pub horizon_days: f64,
    /// Estimation method.
    pub method: VarMethod,
}

impl VarParams {
    /// 95% one-day historical VaR.
    pub fn default_historical() -> Self {
        Self {
            confidence: 0.95,
            horizon_days: 1.0,
            method: VarMethod::Historical,
        }
    }
}

/// Computed VaR figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarResult {
    /// Loss threshold in account currency (positive number).
    pub value: f64,
    /// Expected shortfall beyond the VaR cutoff, when the estimator
    /// provides one.
    pub cvar: Option<f64>,
    /// Confidence level the figure was computed at.
    pub confidence: f64,
    /// Horizon in days.
    pub horizon_days: f64,
    /// Method that produced the figure.
    pub method: VarMethod,
    /// Portfolio value the loss is scaled against.
    pub portfolio_value: f64,
}
