//! Parametric (variance-covariance) Value-at-Risk.

use crate::math;
use crate::types::RiskError;

use super::{VarMethod, VarResult, MIN_OBSERVATIONS};

/// Normal quantile for the supported confidence levels.
///
/// # Errors
///
/// [`RiskError::InvalidInput`] for any confidence other than 0.95 or 0.99.
pub fn z_score(confidence: f64) -> Result<f64, RiskError> {
    if (confidence - 0.95).abs() < 1e-9 {
        Ok(1.645)
    } else if (confidence - 0.99).abs() < 1e-9 {
        Ok(2.326)
    } else {
        Err(RiskError::invalid_input(format!(
            "parametric VaR supports 95% and 99% confidence, got {}",
            confidence
        )))
    }
}

/// Parametric VaR assuming normally distributed daily returns.
///
/// `VaR = |mean - z * stddev| * portfolio_value * sqrt(horizon_days)` with
/// z = 1.645 at 95% and 2.326 at 99% confidence.
///
/// # Errors
///
/// - [`RiskError::InsufficientData`] with fewer than 30 observations
/// - [`RiskError::InvalidInput`] for an unsupported confidence or a
///   non-positive horizon
pub fn parametric_var(
    daily_returns: &[f64],
    portfolio_value: f64,
    confidence: f64,
    horizon_days: f64,
) -> Result<VarResult, RiskError> {
    if daily_returns.len() < MIN_OBSERVATIONS {
        return Err(RiskError::insufficient_data(
            daily_returns.len(),
            MIN_OBSERVATIONS,
        ));
    }
    if horizon_days <= 0.0 {
        return Err(RiskError::invalid_input(format!(
            "horizon must be positive, got {} days",
            horizon_days
        )));
    }
    let z = z_score(confidence)?;

    let mean = math::mean(daily_returns);
    let std = math::std_dev(daily_returns);
    let value = (mean - z * std).abs() * portfolio_value * horizon_days.sqrt();

    Ok(VarResult {
        value,
        cvar: None,
        confidence,
        horizon_days,
        method: VarMethod::Parametric,
        portfolio_value,
    })
}
