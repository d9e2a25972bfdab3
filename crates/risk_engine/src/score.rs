//! Overall risk score.
//!
//! A bounded weighted sum of leverage, gross exposure, current drawdown,
//! and position-count concentration. Each input contributes within a fixed
//! point budget and the total is clamped to [0, 100].

/// Maximum points contributed by leverage.
pub const LEVERAGE_BUDGET: f64 = 30.0;
/// Maximum points contributed by gross exposure percentage.
pub const EXPOSURE_BUDGET: f64 = 25.0;
/// Maximum points contributed by current drawdown.
pub const DRAWDOWN_BUDGET: f64 = 25.0;
/// Maximum points contributed by position-count concentration.
pub const CONCENTRATION_BUDGET: f64 = 20.0;

/// Computes the overall 0-100 risk score.
///
/// Contributions saturate at their budgets:
/// - leverage: 10 points per turn of leverage, capped at 30 (3x saturates)
/// - gross exposure: 1 point per 8% of portfolio value, capped at 25
/// - drawdown: 1.25 points per percent of current drawdown, capped at 25
/// - concentration: `20 / position_count`, so a single position scores the
///   full 20 and the contribution fades as the book diversifies; an empty
///   book scores 0
///
/// # Examples
///
/// ```rust
/// use risk_engine::score::overall_risk_score;
///
/// // Flat book: nothing at risk.
/// assert_eq!(overall_risk_score(0.0, 0.0, 0.0, 0), 0.0);
///
/// // Everything saturated.
/// assert_eq!(overall_risk_score(5.0, 400.0, 40.0, 1), 100.0);
/// ```
pub fn overall_risk_score(
    leverage: f64,
    gross_exposure_pct: f64,
    current_drawdown_pct: f64,
    position_count: usize,
) -> f64 {
    let leverage_pts = (leverage.max(0.0) * 10.0).min(LEVERAGE_BUDGET);
    let exposure_pts = (gross_exposure_pct.max(0.0) / 8.0).min(EXPOSURE_BUDGET);
    let drawdown_pts = (current_drawdown_pct.max(0.0) * 1.25).min(DRAWDOWN_BUDGET);
    let concentration_pts = if position_count == 0 {
        0.0
    } else {
        (CONCENTRATION_BUDGET / position_count as f64).min(CONCENTRATION_BUDGET)
    };

    (leverage_pts + exposure_pts + drawdown_pts + concentration_pts).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_empty_book_scores_zero() {
        assert_eq!(overall_risk_score(0.0, 0.0, 0.0, 0), 0.0);
    }

    #[test]
    fn test_each_budget_saturates() {
        assert_eq!(overall_risk_score(10.0, 0.0, 0.0, 0), LEVERAGE_BUDGET);
        assert_eq!(overall_risk_score(0.0, 1_000.0, 0.0, 0), EXPOSURE_BUDGET);
        assert_eq!(overall_risk_score(0.0, 0.0, 99.0, 0), DRAWDOWN_BUDGET);
        assert_eq!(overall_risk_score(0.0, 0.0, 0.0, 1), CONCENTRATION_BUDGET);
    }

    #[test]
    fn test_moderate_book() {
        // 1.5x leverage, 80% gross, 4% drawdown, 5 positions.
        let score = overall_risk_score(1.5, 80.0, 4.0, 5);
        assert_relative_eq!(score, 15.0 + 10.0 + 5.0 + 4.0);
    }

    #[test]
    fn test_concentration_fades_with_diversification() {
        let concentrated = overall_risk_score(0.0, 0.0, 0.0, 1);
        let diversified = overall_risk_score(0.0, 0.0, 0.0, 10);
        assert!(concentrated > diversified);
        assert_relative_eq!(diversified, 2.0);
    }

    proptest! {
        #[test]
        fn prop_score_always_in_bounds(
            leverage in -10.0..50.0f64,
            gross_pct in -100.0..5_000.0f64,
            drawdown in -10.0..200.0f64,
            count in 0usize..500,
        ) {
            let score = overall_risk_score(leverage, gross_pct, drawdown, count);
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }
}
