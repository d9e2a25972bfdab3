//! Monte Carlo factor simulation.
//!
//! The engine samples each risk factor from its configured distribution
//! through an injected [`RandomSource`], combines factor returns into a
//! portfolio return via exposure weights, and reads VaR/CVaR off the
//! empirical quantiles of the simulated distribution. Antithetic variates
//! mirror every draw to halve variance within the same realized budget.

mod distribution;
mod engine;
mod factor;
mod random;

pub use distribution::{box_muller, chi_square, student_t, FactorDistribution};
pub use engine::{MonteCarloConfig, MonteCarloEngine, MonteCarloVarResult};
pub use factor::{FactorExposure, RiskFactorModel};
pub use random::{RandomSource, StdRandomSource};
