//! Simulated risk factor models.

use serde::{Deserialize, Serialize};

use super::distribution::FactorDistribution;
use crate::types::RiskError;

/// One simulated risk driver, derived from current positions.
///
/// Ephemeral: constructed per simulation call, never persisted. Drift and
/// volatility are daily decimals; `correlation` couples the factor to the
/// common market shock in a one-factor correlation structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorModel {
    /// Factor name, e.g. the instrument symbol.
    pub name: String,
    /// Current level of the factor.
    pub current_value: f64,
    /// Daily volatility (decimal).
    pub volatility: f64,
    /// Daily drift (decimal).
    pub drift: f64,
    /// Correlation to the common market shock, in [-1, 1].
    pub correlation: f64,
    /// Shock distribution.
    pub distribution: FactorDistribution,
}

impl RiskFactorModel {
    /// Creates a normally distributed factor with no market correlation.
    pub fn normal(name: impl Into<String>, current_value: f64, volatility: f64, drift: f64) -> Self {
        Self {
            name: name.into(),
            current_value,
            volatility,
            drift,
            correlation: 0.0,
            distribution: FactorDistribution::Normal,
        }
    }

    /// Sets the correlation to the common market shock.
    pub fn with_correlation(mut self, correlation: f64) -> Self {
        self.correlation = correlation;
        self
    }

    /// Sets the shock distribution.
    pub fn with_distribution(mut self, distribution: FactorDistribution) -> Self {
        self.distribution = distribution;
        self
    }

    /// Validates the factor parameters.
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.volatility < 0.0 {
            return Err(RiskError::invalid_input(format!(
                "factor {}: negative volatility {}",
                self.name, self.volatility
            )));
        }
        if !(-1.0..=1.0).contains(&self.correlation) {
            return Err(RiskError::invalid_input(format!(
                "factor {}: correlation {} outside [-1, 1]",
                self.name, self.correlation
            )));
        }
        self.distribution
            .validate()
            .map_err(RiskError::invalid_input)
    }
}

/// A factor together with its weight in the portfolio return.
///
/// Weights are position-value shares of portfolio value, so the simulated
/// portfolio return is the weight-sum of per-factor returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorExposure {
    /// The simulated factor.
    pub model: RiskFactorModel,
    /// Portfolio weight of the factor (signed: short exposure is negative).
    pub weight: f64,
}

impl FactorExposure {
    /// Creates a new weighted factor exposure.
    pub fn new(model: RiskFactorModel, weight: f64) -> Self {
        Self { model, weight }
    }
}
