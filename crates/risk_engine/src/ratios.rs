//! Risk-adjusted performance ratios.
//!
//! Sharpe, Sortino, and Calmar over a daily-return series, annualised on a
//! 252-trading-day convention. Each ratio degrades to 0 (never NaN or
//! infinity) when its denominator is 0.

use serde::{Deserialize, Serialize};

use crate::math;
use crate::types::RiskError;
use crate::var::MIN_OBSERVATIONS;

/// Trading days per year used for annualisation.
pub const TRADING_DAYS: f64 = 252.0;

/// Annualised performance ratio set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceRatios {
    /// Excess return over the risk-free rate per unit of total volatility.
    pub sharpe: f64,
    /// Excess return per unit of downside semi-deviation.
    pub sortino: f64,
    /// Annualised return over the maximum drawdown fraction.
    pub calmar: f64,
    /// Annualised arithmetic return.
    pub annualized_return: f64,
    /// Annualised standard deviation of daily returns.
    pub annualized_volatility: f64,
}

/// Computes Sharpe, Sortino, and Calmar ratios.
///
/// - Sharpe: `(annualised return - risk_free_rate) / annualised stddev`
/// - Sortino: same numerator over the annualised downside semi-deviation,
///   counting only negative daily returns against a 0% minimum acceptable
///   return
/// - Calmar: `annualised return / (max_drawdown_pct / 100)`
///
/// `risk_free_rate` is an annualised decimal (e.g. 0.04) supplied by an
/// external rate source. `max_drawdown_pct` is the percentage figure from
/// drawdown analysis.
///
/// # Errors
///
/// [`RiskError::InsufficientData`] with fewer than 30 observations.
///
/// # Examples
///
/// ```rust
/// use risk_engine::ratios::compute_ratios;
///
/// // Flat returns: zero volatility must yield Sharpe 0, not infinity.
/// let flat = vec![0.0; 40];
/// let ratios = compute_ratios(&flat, 0.04, 10.0).unwrap();
/// assert_eq!(ratios.sharpe, 0.0);
/// ```
pub fn compute_ratios(
    daily_returns: &[f64],
    risk_free_rate: f64,
    max_drawdown_pct: f64,
) -> Result<PerformanceRatios, RiskError> {
    if daily_returns.len() < MIN_OBSERVATIONS {
        return Err(RiskError::insufficient_data(
            daily_returns.len(),
            MIN_OBSERVATIONS,
        ));
    }

    let annualized_return = math::mean(daily_returns) * TRADING_DAYS;
    let annualized_volatility = math::std_dev(daily_returns) * TRADING_DAYS.sqrt();
    let excess = annualized_return - risk_free_rate;

    let sharpe = if annualized_volatility > 0.0 {
        excess / annualized_volatility
    } else {
        0.0
    };

    let downside = downside_deviation(daily_returns) * TRADING_DAYS.sqrt();
    let sortino = if downside > 0.0 { excess / downside } else { 0.0 };

    let dd_fraction = max_drawdown_pct / 100.0;
    let calmar = if dd_fraction > 0.0 {
        annualized_return / dd_fraction
    } else {
        0.0
    };

    Ok(PerformanceRatios {
        sharpe,
        sortino,
        calmar,
        annualized_return,
        annualized_volatility,
    })
}

/// Downside semi-deviation of daily returns against a 0% minimum
/// acceptable return. Only negative returns contribute; the divisor is the
/// full observation count.
fn downside_deviation(daily_returns: &[f64]) -> f64 {
    if daily_returns.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = daily_returns
        .iter()
        .filter(|r| **r < 0.0)
        .map(|r| r * r)
        .sum();
    (sum_sq / daily_returns.len() as f64).sqrt()
}
