//! Snapshot assembly: one pass over supplied inputs producing a complete
//! [`RiskMetricsSnapshot`].

use chrono::{DateTime, Utc};

use crate::drawdown::{compute_drawdown, ValuePoint};
use crate::ratios::compute_ratios;
use crate::score::overall_risk_score;
use crate::types::{PositionSnapshot, RiskError, RiskLevel, RiskMetricsSnapshot, SubjectId, TenantId};
use crate::exposure;
use crate::var::historical_var;

/// Everything the engine needs to compute one snapshot.
///
/// All inputs are externally supplied; the engine performs no I/O. The
/// value history and daily returns come from previously persisted
/// snapshots of the same subject.
#[derive(Debug, Clone)]
pub struct SnapshotInputs {
    /// Subject the snapshot is computed for.
    pub subject: SubjectId,
    /// Tenant scope.
    pub tenant: TenantId,
    /// Open positions.
    pub positions: Vec<PositionSnapshot>,
    /// Cash balance from the wallet collaborator.
    pub cash_balance: f64,
    /// Margin available from the wallet collaborator.
    pub margin_available: f64,
    /// Time-ordered portfolio value history from prior snapshots.
    pub value_history: Vec<ValuePoint>,
    /// Daily return series derived from prior snapshots.
    pub daily_returns: Vec<f64>,
    /// Annualised risk-free rate (decimal) from the rate collaborator.
    pub risk_free_rate: f64,
}

/// Computes a complete risk metrics snapshot.
///
/// VaR and performance ratio fields are `None` when fewer than 30 return
/// observations exist; that is not an error for snapshot assembly, only
/// for the dedicated VaR operations.
///
/// # Errors
///
/// [`RiskError::NonFinite`] if any headline figure (portfolio value,
/// leverage, score) degenerates to NaN or infinity.
pub fn compute_snapshot(
    inputs: &SnapshotInputs,
    now: DateTime<Utc>,
) -> Result<RiskMetricsSnapshot, RiskError> {
    let unrealized_pnl: f64 = inputs.positions.iter().map(|p| p.unrealized_pnl).sum();
    let realized_pnl: f64 = inputs.positions.iter().map(|p| p.realized_pnl).sum();
    let portfolio_value = inputs.cash_balance + inputs.margin_available + unrealized_pnl;

    let exp = exposure::aggregate_exposure(&inputs.positions, portfolio_value);
    let leverage = exposure::leverage(exp.gross, portfolio_value);
    let concentration = exposure::herfindahl_index(&inputs.positions, portfolio_value);
    let largest_position_pct = exposure::largest_position_pct(&inputs.positions, portfolio_value);

    // The running history plus the value being computed right now.
    let mut history = inputs.value_history.clone();
    history.push(ValuePoint::new(now, portfolio_value));
    let drawdown = compute_drawdown(&history);

    let var = historical_var(&inputs.daily_returns, portfolio_value, 0.95, 1.0).ok();
    let var_99 = historical_var(&inputs.daily_returns, portfolio_value, 0.99, 1.0).ok();
    let ratios = compute_ratios(&inputs.daily_returns, inputs.risk_free_rate, drawdown.max_pct).ok();

    let overall = overall_risk_score(
        leverage,
        exp.gross_pct,
        drawdown.current_pct,
        inputs.positions.len(),
    );

    for (name, value) in [
        ("portfolio value", portfolio_value),
        ("leverage", leverage),
        ("risk score", overall),
    ] {
        if !value.is_finite() {
            return Err(RiskError::NonFinite(name.to_string()));
        }
    }

    Ok(RiskMetricsSnapshot {
        subject: inputs.subject.clone(),
        tenant: inputs.tenant.clone(),
        portfolio_value,
        cash_balance: inputs.cash_balance,
        margin_available: inputs.margin_available,
        exposure: exp,
        leverage,
        largest_position_pct,
        unrealized_pnl,
        realized_pnl,
        total_pnl: unrealized_pnl + realized_pnl,
        drawdown,
        concentration,
        var_95: var.as_ref().map(|v| v.value),
        var_99: var_99.as_ref().map(|v| v.value),
        cvar_95: var.as_ref().and_then(|v| v.cvar),
        sharpe: ratios.as_ref().map(|r| r.sharpe),
        sortino: ratios.as_ref().map(|r| r.sortino),
        calmar: ratios.as_ref().map(|r| r.calmar),
        overall_risk_score: overall,
        risk_level: RiskLevel::from_score(overall),
        calculated_at: now,
    })
}

/// Daily simple returns from consecutive portfolio values.
///
/// Steps whose starting value is non-positive are skipped; they carry no
/// meaningful return.
pub fn daily_returns_from_values(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PositionSide;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn inputs_with_positions(positions: Vec<PositionSnapshot>) -> SnapshotInputs {
        SnapshotInputs {
            subject: SubjectId::new("acct-1"),
            tenant: TenantId::new("t1"),
            positions,
            cash_balance: 50_000.0,
            margin_available: 50_000.0,
            value_history: Vec::new(),
            daily_returns: Vec::new(),
            risk_free_rate: 0.04,
        }
    }

    #[test]
    fn test_empty_portfolio_snapshot() {
        let snapshot = compute_snapshot(&inputs_with_positions(Vec::new()), Utc::now()).unwrap();
        assert_eq!(snapshot.portfolio_value, 100_000.0);
        assert_eq!(snapshot.leverage, 0.0);
        assert_eq!(snapshot.concentration, 0.0);
        assert_eq!(snapshot.var_95, None);
        assert_eq!(snapshot.sharpe, None);
        assert_eq!(snapshot.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_snapshot_invariants() {
        let positions = vec![
            PositionSnapshot::new(PositionSide::Long, 100.0, 500.0, 2_000.0, 500.0),
            PositionSnapshot::new(PositionSide::Short, 50.0, 400.0, -1_000.0, 0.0),
        ];
        let snapshot = compute_snapshot(&inputs_with_positions(positions), Utc::now()).unwrap();

        assert_relative_eq!(snapshot.unrealized_pnl, 1_000.0);
        assert_relative_eq!(snapshot.total_pnl, 1_500.0);
        assert_relative_eq!(snapshot.portfolio_value, 101_000.0);
        assert_relative_eq!(snapshot.exposure.gross, 70_000.0);
        assert_relative_eq!(snapshot.leverage, 70_000.0 / 101_000.0, epsilon = 1e-12);
        assert!((0.0..=100.0).contains(&snapshot.overall_risk_score));
        assert_eq!(
            snapshot.risk_level,
            RiskLevel::from_score(snapshot.overall_risk_score)
        );
    }

    #[test]
    fn test_var_populated_with_enough_history() {
        let mut inputs = inputs_with_positions(Vec::new());
        inputs.daily_returns = (0..60).map(|i| ((i % 9) as f64 - 4.0) / 100.0).collect();
        let snapshot = compute_snapshot(&inputs, Utc::now()).unwrap();
        assert!(snapshot.var_95.is_some());
        assert!(snapshot.var_99.unwrap() >= snapshot.var_95.unwrap());
        assert!(snapshot.sharpe.is_some());
    }

    #[test]
    fn test_drawdown_includes_current_value() {
        let start = Utc::now() - Duration::days(2);
        let mut inputs = inputs_with_positions(Vec::new());
        // Two historic points above today's computed value of 100k.
        inputs.value_history = vec![
            ValuePoint::new(start, 125_000.0),
            ValuePoint::new(start + Duration::days(1), 110_000.0),
        ];
        let snapshot = compute_snapshot(&inputs, Utc::now()).unwrap();
        assert_relative_eq!(snapshot.drawdown.current_pct, 20.0);
        assert_eq!(snapshot.drawdown.peak_value, 125_000.0);
        assert_eq!(snapshot.drawdown.duration_days, 2);
    }

    #[test]
    fn test_daily_returns_from_values() {
        let returns = daily_returns_from_values(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert_relative_eq!(returns[0], 0.10);
        assert_relative_eq!(returns[1], -0.10);
    }

    #[test]
    fn test_daily_returns_skip_non_positive_start() {
        let returns = daily_returns_from_values(&[0.0, 100.0, 110.0]);
        assert_eq!(returns.len(), 1);
        assert_relative_eq!(returns[0], 0.10);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut inputs = inputs_with_positions(Vec::new());
        inputs.cash_balance = f64::NAN;
        let err = compute_snapshot(&inputs, Utc::now()).unwrap_err();
        assert!(matches!(err, RiskError::NonFinite(_)));
    }
}
