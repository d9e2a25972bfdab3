//! Historical (empirical) Value-at-Risk.

use crate::math;
use crate::types::RiskError;

use super::{VarMethod, VarResult, MIN_OBSERVATIONS};

/// Historical VaR and CVaR from a daily-return series.
///
/// Returns are sorted ascending; the VaR cutoff is the return at index
/// `floor(n * (1 - confidence))`, expressed as a positive loss and scaled
/// by `portfolio_value` and `sqrt(horizon_days)`. CVaR averages the
/// returns strictly below the cutoff index and is 0 when that tail is
/// empty.
///
/// # Errors
///
/// - [`RiskError::InsufficientData`] with fewer than 30 observations
/// - [`RiskError::InvalidInput`] for a confidence outside (0, 1) or a
///   non-positive horizon
///
/// # Examples
///
/// ```rust
/// use risk_engine::var::historical_var;
///
/// let returns: Vec<f64> = (0..100).map(|i| (i as f64 - 50.0) / 1_000.0).collect();
/// let var = historical_var(&returns, 100_000.0, 0.95, 1.0).unwrap();
/// assert!(var.value > 0.0);
/// ```
pub fn historical_var(
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
    if !(0.0..1.0).contains(&confidence) || confidence == 0.0 {
        return Err(RiskError::invalid_input(format!(
            "confidence must be in (0, 1), got {}",
            confidence
        )));
    }
    if horizon_days <= 0.0 {
        return Err(RiskError::invalid_input(format!(
            "horizon must be positive, got {} days",
            horizon_days
        )));
    }

    let mut sorted = daily_returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let idx = math::tail_index(sorted.len(), confidence);
    let scale = portfolio_value * horizon_days.sqrt();
    let value = (-sorted[idx]).max(0.0) * scale;

    let tail = &sorted[..idx];
    let cvar = if tail.is_empty() {
        0.0
    } else {
        (-math::mean(tail)).max(0.0) * scale
    };

    Ok(VarResult {
        value,
        cvar: Some(cvar),
        confidence,
        horizon_days,
        method: VarMethod::Historical,
        portfolio_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spread_returns(n: usize) -> Vec<f64> {
        // Evenly spread daily returns from -5% to +5%.
        (0..n)
            .map(|i| -0.05 + 0.10 * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn test_insufficient_data() {
        let returns = vec![0.01; 29];
        let err = historical_var(&returns, 100_000.0, 0.95, 1.0).unwrap_err();
        assert_eq!(err, RiskError::insufficient_data(29, 30));
    }

    #[test]
    fn test_var_at_95() {
        let returns = spread_returns(100);
        let var = historical_var(&returns, 100_000.0, 0.95, 1.0).unwrap();
        // Index floor(100 * 0.05) = 5 -> return -5% + 10% * 5/99.
        let expected = (0.05 - 0.10 * 5.0 / 99.0) * 100_000.0;
        assert_relative_eq!(var.value, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_confidence_monotonicity() {
        let returns = spread_returns(250);
        let var95 = historical_var(&returns, 100_000.0, 0.95, 1.0).unwrap();
        let var99 = historical_var(&returns, 100_000.0, 0.99, 1.0).unwrap();
        assert!(var99.value >= var95.value);
        assert!(var99.cvar.unwrap() >= var95.cvar.unwrap());
    }

    #[test]
    fn test_horizon_scaling() {
        let returns = spread_returns(100);
        let one_day = historical_var(&returns, 100_000.0, 0.95, 1.0).unwrap();
        let ten_day = historical_var(&returns, 100_000.0, 0.95, 10.0).unwrap();
        assert_relative_eq!(ten_day.value, one_day.value * 10.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_cvar_exceeds_var() {
        let returns = spread_returns(250);
        let var = historical_var(&returns, 100_000.0, 0.95, 1.0).unwrap();
        // The tail mean is deeper into losses than its boundary.
        assert!(var.cvar.unwrap() >= var.value);
    }

    #[test]
    fn test_all_positive_returns_zero_var() {
        let returns: Vec<f64> = (1..=60).map(|i| i as f64 / 1_000.0).collect();
        let var = historical_var(&returns, 100_000.0, 0.95, 1.0).unwrap();
        assert_eq!(var.value, 0.0);
    }

    #[test]
    fn test_invalid_confidence() {
        let returns = spread_returns(100);
        assert!(historical_var(&returns, 100_000.0, 1.0, 1.0).is_err());
        assert!(historical_var(&returns, 100_000.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_invalid_horizon() {
        let returns = spread_returns(100);
        assert!(historical_var(&returns, 100_000.0, 0.95, 0.0).is_err());
    }
}
