//! Risk profile classification from snapshot history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use risk_engine::{RiskError, RiskMetricsSnapshot, SubjectId, TenantId};

/// Behavioural risk tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    /// Low average score and leverage.
    Conservative,
    /// Mid-band usage of risk capacity.
    Balanced,
    /// Sustained high score or leverage.
    Aggressive,
}

impl RiskTolerance {
    /// Leverage ceiling recommended for the band.
    pub fn recommended_max_leverage(&self) -> f64 {
        match self {
            Self::Conservative => 1.5,
            Self::Balanced => 3.0,
            Self::Aggressive => 5.0,
        }
    }
}

/// Long-lived classification of a subject's risk behaviour.
///
/// Derived from recent snapshot history and cached under the long
/// `Profile` TTL; unlike a snapshot it changes slowly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Subject the profile describes.
    pub subject: SubjectId,
    /// Tenant scope.
    pub tenant: TenantId,
    /// Mean overall risk score across the observed snapshots.
    pub avg_score: f64,
    /// Mean leverage across the observed snapshots.
    pub avg_leverage: f64,
    /// Worst drawdown seen in the observed snapshots, percent.
    pub worst_drawdown_pct: f64,
    /// Tolerance band the averages map to.
    pub tolerance: RiskTolerance,
    /// Leverage ceiling recommended for the band.
    pub recommended_max_leverage: f64,
    /// Number of snapshots the profile was built from.
    pub observed_snapshots: usize,
    /// Time of classification.
    pub built_at: DateTime<Utc>,
}

/// Builds a profile from recent snapshots (oldest first).
///
/// # Errors
///
/// [`RiskError::InsufficientData`] when the history is empty.
pub fn build_profile(
    subject: &SubjectId,
    tenant: &TenantId,
    history: &[RiskMetricsSnapshot],
    now: DateTime<Utc>,
) -> Result<RiskProfile, RiskError> {
    if history.is_empty() {
        return Err(RiskError::insufficient_data(0, 1));
    }

    let n = history.len() as f64;
    let avg_score = history.iter().map(|s| s.overall_risk_score).sum::<f64>() / n;
    let avg_leverage = history.iter().map(|s| s.leverage).sum::<f64>() / n;
    let worst_drawdown_pct = history
        .iter()
        .map(|s| s.drawdown.max_pct)
        .fold(0.0, f64::max);

    let tolerance = if avg_score <= 30.0 && avg_leverage <= 1.2 {
        RiskTolerance::Conservative
    } else if avg_score <= 60.0 && avg_leverage <= 3.0 {
        RiskTolerance::Balanced
    } else {
        RiskTolerance::Aggressive
    };

    Ok(RiskProfile {
        subject: subject.clone(),
        tenant: tenant.clone(),
        avg_score,
        avg_leverage,
        worst_drawdown_pct,
        tolerance,
        recommended_max_leverage: tolerance.recommended_max_leverage(),
        observed_snapshots: history.len(),
        built_at: now,
    })
}
