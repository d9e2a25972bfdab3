//! Service configuration.
//!
//! Loaded from TOML with per-field defaults, so an empty file (or no file
//! at all) yields a working configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use infra_lock::LockConfig;
use risk_engine::MonteCarloConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("IO error: {0}")]
    Io(String),

    /// Failed to parse the configuration file.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A field failed validation.
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Risk service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskServiceConfig {
    /// Lock TTL in seconds.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,

    /// Maximum lock acquisition attempts.
    #[serde(default = "default_lock_max_attempts")]
    pub lock_max_attempts: u32,

    /// Backoff base delay in milliseconds.
    #[serde(default = "default_lock_base_delay_ms")]
    pub lock_base_delay_ms: u64,

    /// Symmetric backoff jitter fraction, in [0, 1].
    #[serde(default = "default_lock_jitter_fraction")]
    pub lock_jitter_fraction: f64,

    /// How many prior snapshots feed drawdown and return series.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Default Monte Carlo draw budget.
    #[serde(default = "default_mc_simulations")]
    pub mc_simulations: usize,

    /// Whether Monte Carlo pairs draws with their mirrors by default.
    #[serde(default = "default_mc_antithetic")]
    pub mc_antithetic: bool,

    /// Daily factor volatility assumed when the subject has no usable
    /// return history.
    #[serde(default = "default_mc_fallback_volatility")]
    pub mc_fallback_volatility: f64,

    /// Correlation of derived factors to the common market shock.
    #[serde(default = "default_mc_market_correlation")]
    pub mc_market_correlation: f64,
}

fn default_lock_ttl_secs() -> u64 {
    30
}

fn default_lock_max_attempts() -> u32 {
    10
}

fn default_lock_base_delay_ms() -> u64 {
    100
}

fn default_lock_jitter_fraction() -> f64 {
    0.25
}

fn default_history_window() -> usize {
    252
}

fn default_mc_simulations() -> usize {
    10_000
}

fn default_mc_antithetic() -> bool {
    true
}

fn default_mc_fallback_volatility() -> f64 {
    0.02
}

fn default_mc_market_correlation() -> f64 {
    0.5
}

impl Default for RiskServiceConfig {
    fn default() -> Self {
        Self {
            lock_ttl_secs: default_lock_ttl_secs(),
            lock_max_attempts: default_lock_max_attempts(),
            lock_base_delay_ms: default_lock_base_delay_ms(),
            lock_jitter_fraction: default_lock_jitter_fraction(),
            history_window: default_history_window(),
            mc_simulations: default_mc_simulations(),
            mc_antithetic: default_mc_antithetic(),
            mc_fallback_volatility: default_mc_fallback_volatility(),
            mc_market_correlation: default_mc_market_correlation(),
        }
    }
}

impl RiskServiceConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "lock_max_attempts must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.lock_jitter_fraction) {
            return Err(ConfigError::Invalid(format!(
                "lock_jitter_fraction must be in [0, 1], got {}",
                self.lock_jitter_fraction
            )));
        }
        if !(-1.0..=1.0).contains(&self.mc_market_correlation) {
            return Err(ConfigError::Invalid(format!(
                "mc_market_correlation must be in [-1, 1], got {}",
                self.mc_market_correlation
            )));
        }
        Ok(())
    }

    /// Lock manager policy derived from this configuration.
    pub fn lock_config(&self) -> LockConfig {
        LockConfig {
            ttl: Duration::from_secs(self.lock_ttl_secs),
            max_attempts: self.lock_max_attempts,
            base_delay: Duration::from_millis(self.lock_base_delay_ms),
            jitter_fraction: self.lock_jitter_fraction,
        }
    }

    /// Default Monte Carlo configuration at the given horizon.
    pub fn monte_carlo_config(&self, horizon_days: f64) -> MonteCarloConfig {
        MonteCarloConfig {
            simulations: self.mc_simulations,
            horizon_days,
            antithetic: self.mc_antithetic,
            seed: None,
        }
    }
}
