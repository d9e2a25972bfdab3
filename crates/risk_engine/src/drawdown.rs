//! Drawdown analysis over a time-ordered portfolio value history.

use chrono::{DateTime, Utc};

use crate::types::DrawdownStats;

/// One observation in a portfolio value history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuePoint {
    /// Observation time.
    pub at: DateTime<Utc>,
    /// Portfolio value at that time.
    pub value: f64,
}

impl ValuePoint {
    /// Creates a new value point.
    pub fn new(at: DateTime<Utc>, value: f64) -> Self {
        Self { at, value }
    }
}

/// Computes drawdown statistics over a time-ordered history.
///
/// Tracks the running peak; the current drawdown is
/// `(peak - latest) / peak * 100`, the max drawdown is the largest such
/// ratio anywhere in the history, and the duration is the number of whole
/// days between the last time the peak was set and the final observation.
///
/// An empty history and non-positive values are degenerate: all figures
/// are 0.
///
/// # Examples
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use risk_engine::drawdown::{compute_drawdown, ValuePoint};
///
/// let start = Utc::now();
/// let history: Vec<ValuePoint> = [100.0, 90.0, 95.0]
///     .iter()
///     .enumerate()
///     .map(|(i, v)| ValuePoint::new(start + Duration::days(i as i64), *v))
///     .collect();
///
/// let dd = compute_drawdown(&history);
/// assert!((dd.max_pct - 10.0).abs() < 1e-9);
/// assert!((dd.current_pct - 5.0).abs() < 1e-9);
/// ```
pub fn compute_drawdown(history: &[ValuePoint]) -> DrawdownStats {
    let mut peak = f64::MIN;
    let mut peak_at: Option<DateTime<Utc>> = None;
    let mut max_pct = 0.0_f64;
    let mut current_pct = 0.0_f64;

    for point in history {
        if point.value >= peak {
            peak = point.value;
            peak_at = Some(point.at);
        }
        current_pct = if peak > 0.0 {
            (peak - point.value) / peak * 100.0
        } else {
            0.0
        };
        max_pct = max_pct.max(current_pct);
    }

    let duration_days = match (peak_at, history.last()) {
        (Some(peak_at), Some(last)) => (last.at - peak_at).num_days().max(0) as u32,
        _ => 0,
    };

    DrawdownStats {
        current_pct,
        max_pct,
        peak_value: if peak == f64::MIN { 0.0 } else { peak },
        duration_days,
    }
}
