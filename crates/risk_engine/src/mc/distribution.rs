//! Risk factor shock distributions.
//!
//! Every sampler returns the base draw together with its antithetic
//! mirror, built by negating the underlying normal primitives. This keeps
//! antithetic pairing exact for asymmetric distributions: the mirror of a
//! log-normal shock is the shock of the negated normal, not the negated
//! shock.

use serde::{Deserialize, Serialize};

use super::random::RandomSource;

/// Distribution a risk factor's shocks are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FactorDistribution {
    /// Standard normal shocks.
    Normal,
    /// Multiplicative shocks `exp(z - 1/2) - 1`; unit-mean exponential of
    /// a standard normal, centred so the shock mean is 0.
    LogNormal,
    /// Student-t shocks with the given degrees of freedom (fat tails).
    StudentT {
        /// Degrees of freedom; must be at least 3.
        df: u32,
    },
    /// Fernandez-Steel skewed-t shocks.
    SkewedT {
        /// Degrees of freedom; must be at least 3.
        df: u32,
        /// Skewness parameter gamma; 1 recovers the symmetric t, above 1
        /// skews right, below 1 skews left. Must be positive.
        skew: f64,
    },
}

impl FactorDistribution {
    /// Validates the distribution parameters.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Normal | Self::LogNormal => Ok(()),
            Self::StudentT { df } => {
                if *df < 3 {
                    Err(format!("student-t needs df >= 3, got {}", df))
                } else {
                    Ok(())
                }
            }
            Self::SkewedT { df, skew } => {
                if *df < 3 {
                    Err(format!("skewed-t needs df >= 3, got {}", df))
                } else if *skew <= 0.0 {
                    Err(format!("skewed-t needs positive skew, got {}", skew))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Draws a (base, antithetic) shock pair.
    pub fn sample_pair(&self, source: &mut dyn RandomSource) -> (f64, f64) {
        match self {
            Self::Normal => {
                let z = box_muller(source);
                (z, -z)
            }
            Self::LogNormal => {
                let z = box_muller(source);
                (log_normal_shock(z), log_normal_shock(-z))
            }
            Self::StudentT { df } => {
                let t = student_t(source, *df);
                (t, -t)
            }
            Self::SkewedT { df, skew } => {
                let t = student_t(source, *df).abs();
                let u = source.next_uniform();
                (skewed_branch(t, u, *skew), skewed_branch(t, 1.0 - u, *skew))
            }
        }
    }
}

/// One standard normal draw via the Box-Muller transform.
///
/// Consumes exactly two uniforms. The first uniform is floored away from 0
/// so the logarithm stays finite.
pub fn box_muller(source: &mut dyn RandomSource) -> f64 {
    let u1 = source.next_uniform().max(f64::MIN_POSITIVE);
    let u2 = source.next_uniform();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Chi-square draw as a sum of `df` squared standard normals.
pub fn chi_square(source: &mut dyn RandomSource, df: u32) -> f64 {
    (0..df).map(|_| box_muller(source).powi(2)).sum()
}

/// Student-t draw: normal over the square root of a scaled chi-square.
pub fn student_t(source: &mut dyn RandomSource, df: u32) -> f64 {
    let z = box_muller(source);
    let chi2 = chi_square(source, df).max(f64::MIN_POSITIVE);
    z / (chi2 / df as f64).sqrt()
}

/// Centred multiplicative log-normal shock for a standard normal draw.
fn log_normal_shock(z: f64) -> f64 {
    (z - 0.5).exp() - 1.0
}

/// Fernandez-Steel branch selection: with probability
/// `gamma^2 / (1 + gamma^2)` the magnitude lands on the right branch
/// scaled by gamma, otherwise on the left branch scaled by 1/gamma.
fn skewed_branch(magnitude: f64, u: f64, gamma: f64) -> f64 {
    let p_right = gamma * gamma / (1.0 + gamma * gamma);
    if u < p_right {
        magnitude * gamma
    } else {
        -magnitude / gamma
    }
}
