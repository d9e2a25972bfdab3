//! Computed risk metrics snapshot types.
//!
//! A [`RiskMetricsSnapshot`] is produced by the engine on every computation,
//! is immutable once produced, and is superseded (never mutated) by the next
//! computation for the same subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SubjectId, TenantId};

/// Overall risk level derived from the 0-100 risk score.
///
/// The mapping is a deterministic step function of the score:
/// `>75` Critical, `>50` High, `>25` Moderate, else Low.
///
/// # Examples
///
/// ```rust
/// use risk_engine::types::RiskLevel;
///
/// assert_eq!(RiskLevel::from_score(10.0), RiskLevel::Low);
/// assert_eq!(RiskLevel::from_score(25.0), RiskLevel::Low);
/// assert_eq!(RiskLevel::from_score(60.0), RiskLevel::High);
/// assert_eq!(RiskLevel::from_score(80.0), RiskLevel::Critical);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score in [0, 25].
    Low,
    /// Score in (25, 50].
    Moderate,
    /// Score in (50, 75].
    High,
    /// Score in (75, 100].
    Critical,
}

impl RiskLevel {
    /// Maps a risk score to its level.
    pub fn from_score(score: f64) -> Self {
        if score > 75.0 {
            Self::Critical
        } else if score > 50.0 {
            Self::High
        } else if score > 25.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// Exposure aggregates split by position side.
///
/// Absolute figures are in account currency; percentage figures are
/// relative to portfolio value and 0 when the portfolio value is 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExposureBreakdown {
    /// Sum of long position values.
    pub long: f64,
    /// Sum of short position values.
    pub short: f64,
    /// Net exposure: long minus short.
    pub net: f64,
    /// Gross exposure: long plus short.
    pub gross: f64,
    /// Long exposure as a percentage of portfolio value.
    pub long_pct: f64,
    /// Short exposure as a percentage of portfolio value.
    pub short_pct: f64,
    /// Net exposure as a percentage of portfolio value.
    pub net_pct: f64,
    /// Gross exposure as a percentage of portfolio value.
    pub gross_pct: f64,
}

/// Drawdown statistics over a time-ordered portfolio value history.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DrawdownStats {
    /// Current drawdown from the running peak, in percent.
    pub current_pct: f64,
    /// Largest drawdown observed across the whole history, in percent.
    pub max_pct: f64,
    /// Portfolio value at the running peak.
    pub peak_value: f64,
    /// Days elapsed since the peak was last set.
    pub duration_days: u32,
}

/// Complete risk metrics for one subject at one point in time.
///
/// Invariant: `overall_risk_score` is within `[0, 100]` and `risk_level`
/// is always `RiskLevel::from_score(overall_risk_score)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetricsSnapshot {
    /// Subject the metrics belong to.
    pub subject: SubjectId,
    /// Tenant scope.
    pub tenant: TenantId,
    /// Total portfolio value (cash + margin + unrealized P&L).
    pub portfolio_value: f64,
    /// Cash balance.
    pub cash_balance: f64,
    /// Margin available for new positions.
    pub margin_available: f64,
    /// Exposure aggregates.
    pub exposure: ExposureBreakdown,
    /// Gross exposure over portfolio value; 1 when portfolio value is 0.
    pub leverage: f64,
    /// Largest single position as a percentage of portfolio value.
    pub largest_position_pct: f64,
    /// Sum of unrealized P&L across open positions.
    pub unrealized_pnl: f64,
    /// Sum of realized P&L across open positions.
    pub realized_pnl: f64,
    /// Total P&L: unrealized plus realized.
    pub total_pnl: f64,
    /// Drawdown statistics over the snapshot history.
    pub drawdown: DrawdownStats,
    /// Herfindahl concentration index, 0 (diversified) to 100 (single position).
    pub concentration: f64,
    /// 95% historical Value-at-Risk, if enough history was available.
    pub var_95: Option<f64>,
    /// 99% historical Value-at-Risk, if enough history was available.
    pub var_99: Option<f64>,
    /// 95% conditional VaR (expected shortfall), if available.
    pub cvar_95: Option<f64>,
    /// Sharpe ratio, if enough history was available.
    pub sharpe: Option<f64>,
    /// Sortino ratio, if enough history was available.
    pub sortino: Option<f64>,
    /// Calmar ratio, if enough history was available.
    pub calmar: Option<f64>,
    /// Overall risk score in [0, 100].
    pub overall_risk_score: f64,
    /// Risk level derived from the score.
    pub risk_level: RiskLevel,
    /// Time of computation.
    pub calculated_at: DateTime<Utc>,
}
