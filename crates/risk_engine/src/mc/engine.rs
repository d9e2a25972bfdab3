//! Monte Carlo factor simulation for Value-at-Risk.

use serde::{Deserialize, Serialize};

use super::distribution::box_muller;
use super::factor::FactorExposure;
use super::random::RandomSource;
use crate::math;
use crate::types::RiskError;

/// Monte Carlo simulation configuration.
///
/// `simulations` is the realized draw budget. With antithetic variates the
/// engine runs half as many base draws and mirrors each one, so the
/// realized count still equals the budget (an odd budget rounds down to
/// the nearest pair).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Requested number of realized simulation draws.
    pub simulations: usize,
    /// Simulation horizon in days.
    pub horizon_days: f64,
    /// Pair every draw with its mirrored counterpart.
    pub antithetic: bool,
    /// Seed for the default random source; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            simulations: 10_000,
            horizon_days: 1.0,
            antithetic: true,
            seed: None,
        }
    }
}

impl MonteCarloConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// [`RiskError::InvalidInput`] for a zero draw budget, an antithetic
    /// budget below one pair, or a non-positive horizon.
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.simulations == 0 {
            return Err(RiskError::invalid_input("simulation budget must be positive"));
        }
        if self.antithetic && self.simulations < 2 {
            return Err(RiskError::invalid_input(
                "antithetic mode needs a budget of at least one pair",
            ));
        }
        if self.horizon_days <= 0.0 {
            return Err(RiskError::invalid_input(format!(
                "horizon must be positive, got {} days",
                self.horizon_days
            )));
        }
        Ok(())
    }
}

/// Simulated VaR figures with distribution diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloVarResult {
    /// 95% Value-at-Risk in account currency.
    pub var_95: f64,
    /// 99% Value-at-Risk in account currency.
    pub var_99: f64,
    /// 99.9% Value-at-Risk in account currency.
    pub var_999: f64,
    /// Expected shortfall beyond the 95% cutoff.
    pub cvar_95: f64,
    /// Expected shortfall beyond the 99% cutoff.
    pub cvar_99: f64,
    /// Expected shortfall beyond the 99.9% cutoff.
    pub cvar_999: f64,
    /// Mean of the simulated return distribution.
    pub mean: f64,
    /// Standard deviation of the simulated returns.
    pub std_dev: f64,
    /// Sample skewness of the simulated returns.
    pub skewness: f64,
    /// Excess kurtosis of the simulated returns.
    pub kurtosis: f64,
    /// Smallest simulated return.
    pub min: f64,
    /// Largest simulated return.
    pub max: f64,
    /// Realized draw count (base plus mirrored).
    pub simulations_run: usize,
    /// Whether antithetic pairing was applied.
    pub antithetic: bool,
    /// Simulation horizon in days.
    pub horizon_days: f64,
    /// Portfolio value the losses are scaled against.
    pub portfolio_value: f64,
}

/// Monte Carlo VaR engine.
///
/// For each draw, every factor's shock is sampled from its configured
/// distribution and coupled to a common market shock through the factor's
/// correlation; the portfolio return is the exposure-weighted sum of
/// per-factor returns over the horizon. Empirical 95/99/99.9% quantiles
/// of the simulated distribution become VaR, their strict tail means
/// become CVaR.
///
/// # Examples
///
/// ```rust
/// use risk_engine::mc::{
///     FactorExposure, MonteCarloConfig, MonteCarloEngine, RiskFactorModel, StdRandomSource,
/// };
///
/// let exposures = vec![FactorExposure::new(
///     RiskFactorModel::normal("SPX", 5_000.0, 0.012, 0.0003),
///     0.6,
/// )];
/// let config = MonteCarloConfig { simulations: 2_000, ..Default::default() };
/// let engine = MonteCarloEngine::new(config).unwrap();
///
/// let mut source = StdRandomSource::from_seed(42);
/// let result = engine.run(&exposures, 250_000.0, &mut source).unwrap();
/// assert_eq!(result.simulations_run, 2_000);
/// assert!(result.var_99 >= result.var_95);
/// ```
pub struct MonteCarloEngine {
    config: MonteCarloConfig,
}

impl MonteCarloEngine {
    /// Creates an engine with a validated configuration.
    pub fn new(config: MonteCarloConfig) -> Result<Self, RiskError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Runs the simulation and estimates VaR/CVaR.
    ///
    /// # Errors
    ///
    /// - [`RiskError::InvalidInput`] if a factor fails validation
    /// - [`RiskError::NonFinite`] if the simulated distribution degenerates
    pub fn run(
        &self,
        exposures: &[FactorExposure],
        portfolio_value: f64,
        source: &mut dyn RandomSource,
    ) -> Result<MonteCarloVarResult, RiskError> {
        for exposure in exposures {
            exposure.model.validate()?;
        }

        let pairs = if self.config.antithetic {
            self.config.simulations / 2
        } else {
            self.config.simulations
        };
        let realized = if self.config.antithetic { pairs * 2 } else { pairs };

        let h = self.config.horizon_days;
        let sqrt_h = h.sqrt();
        let mut returns = Vec::with_capacity(realized);

        for _ in 0..pairs {
            let market = box_muller(source);
            let mut base = 0.0;
            let mut mirrored = 0.0;
            for exposure in exposures {
                let model = &exposure.model;
                let (draw, anti) = model.distribution.sample_pair(source);
                let rho = model.correlation;
                let idio = (1.0 - rho * rho).sqrt();
                let shock = rho * market + idio * draw;
                let anti_shock = rho * (-market) + idio * anti;
                base += exposure.weight * (model.drift * h + model.volatility * sqrt_h * shock);
                mirrored +=
                    exposure.weight * (model.drift * h + model.volatility * sqrt_h * anti_shock);
            }
            returns.push(base);
            if self.config.antithetic {
                returns.push(mirrored);
            }
        }

        let mean = math::mean(&returns);
        let std_dev = math::std_dev(&returns);
        if !mean.is_finite() || !std_dev.is_finite() {
            return Err(RiskError::NonFinite("monte carlo return distribution".into()));
        }

        let mut sorted = returns.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let (var_95, cvar_95) = tail_figures(&sorted, 0.95, portfolio_value);
        let (var_99, cvar_99) = tail_figures(&sorted, 0.99, portfolio_value);
        let (var_999, cvar_999) = tail_figures(&sorted, 0.999, portfolio_value);

        Ok(MonteCarloVarResult {
            var_95,
            var_99,
            var_999,
            cvar_95,
            cvar_99,
            cvar_999,
            mean,
            std_dev,
            skewness: math::skewness(&returns),
            kurtosis: math::excess_kurtosis(&returns),
            min: sorted.first().copied().unwrap_or(0.0),
            max: sorted.last().copied().unwrap_or(0.0),
            simulations_run: realized,
            antithetic: self.config.antithetic,
            horizon_days: h,
            portfolio_value,
        })
    }
}

/// VaR and strict-tail CVaR at one confidence level over an
/// ascending-sorted return sample.
fn tail_figures(sorted: &[f64], confidence: f64, portfolio_value: f64) -> (f64, f64) {
    if sorted.is_empty() {
        return (0.0, 0.0);
    }
    let idx = math::tail_index(sorted.len(), confidence);
    let var = (-sorted[idx]).max(0.0) * portfolio_value;
    let tail = &sorted[..idx];
    let cvar = if tail.is_empty() {
        0.0
    } else {
        (-math::mean(tail)).max(0.0) * portfolio_value
    };
    (var, cvar)
}
