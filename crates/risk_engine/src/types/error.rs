//! Error types for risk computation.

use thiserror::Error;

/// Categorised risk computation errors.
///
/// # Variants
/// - `InsufficientData`: fewer observations than the statistic requires
/// - `InvalidInput`: invalid parameter or malformed input series
/// - `NonFinite`: a computation produced NaN or infinity
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    /// Not enough historical observations for a statistically meaningful
    /// result. Callers must wait for more history; there is no synthetic
    /// fallback.
    #[error("insufficient data: got {got} observations, need at least {need}")]
    InsufficientData {
        /// Number of observations provided.
        got: usize,
        /// Minimum required observations.
        need: usize,
    },

    /// Invalid input data or parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A computation produced a non-finite value.
    #[error("non-finite result in {0}")]
    NonFinite(String),
}

impl RiskError {
    /// Create an insufficient data error.
    pub fn insufficient_data(got: usize, need: usize) -> Self {
        Self::InsufficientData { got, need }
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Check if the error is due to insufficient data.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_display() {
        let err = RiskError::insufficient_data(12, 30);
        assert_eq!(
            format!("{}", err),
            "insufficient data: got 12 observations, need at least 30"
        );
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_non_finite_display() {
        let err = RiskError::NonFinite("leverage".to_string());
        assert_eq!(format!("{}", err), "non-finite result in leverage");
    }

    #[test]
    fn test_error_trait_implementation() {
        let err = RiskError::invalid_input("empty series");
        let _: &dyn std::error::Error = &err;
    }
}
