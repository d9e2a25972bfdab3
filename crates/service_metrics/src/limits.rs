//! Risk limits and their evaluation against snapshots.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use risk_engine::{RiskMetricsSnapshot, SubjectId, TenantId};

use crate::providers::ProviderError;

/// Metric a limit constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    /// Maximum leverage.
    MaxLeverage,
    /// Maximum current drawdown, percent.
    MaxDrawdownPct,
    /// Maximum single-position share of portfolio value, percent.
    MaxPositionPct,
    /// Maximum gross exposure, percent of portfolio value.
    MaxGrossExposurePct,
    /// Maximum 95% Value-at-Risk in account currency.
    MaxVar95,
}

/// One configured risk limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimit {
    /// Stable limit identifier.
    pub id: String,
    /// Constrained metric.
    pub kind: LimitKind,
    /// Threshold the metric must stay at or below.
    pub threshold: f64,
    /// Disabled limits are kept but never evaluated.
    pub enabled: bool,
}

impl RiskLimit {
    /// Creates an enabled limit.
    pub fn new(id: impl Into<String>, kind: LimitKind, threshold: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            threshold,
            enabled: true,
        }
    }
}

/// A limit the latest snapshot breached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitViolation {
    /// Identifier of the breached limit.
    pub limit_id: String,
    /// Constrained metric.
    pub kind: LimitKind,
    /// Configured threshold.
    pub threshold: f64,
    /// Observed value that breached it.
    pub observed: f64,
}

/// Source of configured limits for a subject.
///
/// Mutations to the underlying limit set must invalidate the `Limits`
/// cache kind before returning; the service exposes
/// `limits_changed` for exactly that.
#[async_trait]
pub trait LimitsProvider: Send + Sync {
    /// Lists the subject's configured limits.
    async fn limits_for(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<Vec<RiskLimit>, ProviderError>;
}

/// Evaluates enabled limits against a snapshot.
///
/// A limit whose observed metric is unavailable (e.g. VaR with a short
/// history) is skipped, not violated.
pub fn evaluate_limits(snapshot: &RiskMetricsSnapshot, limits: &[RiskLimit]) -> Vec<LimitViolation> {
    limits
        .iter()
        .filter(|limit| limit.enabled)
        .filter_map(|limit| {
            let observed = match limit.kind {
                LimitKind::MaxLeverage => Some(snapshot.leverage),
                LimitKind::MaxDrawdownPct => Some(snapshot.drawdown.current_pct),
                LimitKind::MaxPositionPct => Some(snapshot.largest_position_pct),
                LimitKind::MaxGrossExposurePct => Some(snapshot.exposure.gross_pct),
                LimitKind::MaxVar95 => snapshot.var_95,
            }?;
            (observed > limit.threshold).then(|| LimitViolation {
                limit_id: limit.id.clone(),
                kind: limit.kind,
                threshold: limit.threshold,
                observed,
            })
        })
        .collect()
}
