//! Lock manager configuration.

use std::time::Duration;

/// Retry and TTL policy for lock acquisition.
///
/// The backoff doubles from `base_delay` on every failed attempt and a
/// symmetric random jitter of `jitter_fraction` times the computed delay
/// is added, so competing processes do not retry in lockstep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockConfig {
    /// Lock TTL; the hard upper bound on how long a stuck holder can
    /// block others.
    pub ttl: Duration,
    /// Maximum acquisition attempts before reporting unavailability.
    pub max_attempts: u32,
    /// Backoff delay before the second attempt; doubles each attempt.
    pub base_delay: Duration,
    /// Symmetric jitter as a fraction of the computed delay, in [0, 1].
    pub jitter_fraction: f64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            jitter_fraction: 0.25,
        }
    }
}

impl LockConfig {
    /// Backoff delay for a zero-based attempt index, before jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt).min(1 << 16);
        self.base_delay.saturating_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LockConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(30));
        assert_eq!(config.max_attempts, 10);
    }

    #[test]
    fn test_backoff_doubles() {
        let config = LockConfig {
            base_delay: Duration::from_millis(50),
            ..Default::default()
        };
        assert_eq!(config.backoff_delay(0), Duration::from_millis(50));
        assert_eq!(config.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_saturates() {
        let config = LockConfig {
            base_delay: Duration::from_millis(100),
            ..Default::default()
        };
        // Large attempt counts must not overflow.
        assert!(config.backoff_delay(200) > Duration::from_secs(1));
    }
}
