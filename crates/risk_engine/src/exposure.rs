//! Exposure, leverage, and concentration aggregation.
//!
//! Pure functions over a slice of [`PositionSnapshot`]s. Portfolio value 0
//! is guarded throughout: percentage figures become 0 and leverage defaults
//! to 1.

use crate::types::{ExposureBreakdown, PositionSide, PositionSnapshot};

/// Aggregates position values into an exposure breakdown.
///
/// Long and short sums are taken over position notional value
/// (price x remaining quantity); net = long - short, gross = long + short.
/// Percentages are relative to `portfolio_value` and 0 when it is 0.
///
/// # Examples
///
/// ```rust
/// use risk_engine::exposure::aggregate_exposure;
/// use risk_engine::types::{PositionSide, PositionSnapshot};
///
/// let positions = vec![
///     PositionSnapshot::new(PositionSide::Long, 100.0, 3.0, 0.0, 0.0),
///     PositionSnapshot::new(PositionSide::Short, 50.0, 2.0, 0.0, 0.0),
/// ];
/// let exp = aggregate_exposure(&positions, 1_000.0);
/// assert_eq!(exp.long, 300.0);
/// assert_eq!(exp.short, 100.0);
/// assert_eq!(exp.net, 200.0);
/// assert_eq!(exp.gross, 400.0);
/// assert_eq!(exp.gross_pct, 40.0);
/// ```
pub fn aggregate_exposure(positions: &[PositionSnapshot], portfolio_value: f64) -> ExposureBreakdown {
    let mut long = 0.0;
    let mut short = 0.0;
    for pos in positions {
        match pos.side {
            PositionSide::Long => long += pos.value(),
            PositionSide::Short => short += pos.value(),
        }
    }
    let net = long - short;
    let gross = long + short;
    let pct = |v: f64| {
        if portfolio_value > 0.0 {
            v / portfolio_value * 100.0
        } else {
            0.0
        }
    };
    ExposureBreakdown {
        long,
        short,
        net,
        gross,
        long_pct: pct(long),
        short_pct: pct(short),
        net_pct: pct(net),
        gross_pct: pct(gross),
    }
}

/// Leverage: gross exposure over portfolio value, defaulting to 1 when the
/// portfolio value is 0.
pub fn leverage(gross_exposure: f64, portfolio_value: f64) -> f64 {
    if portfolio_value > 0.0 {
        gross_exposure / portfolio_value
    } else {
        1.0
    }
}

/// Herfindahl concentration index scaled to [0, 100].
///
/// Sum of squared position-value shares of portfolio value: 0 means fully
/// diversified, 100 means a single position carries the whole portfolio.
pub fn herfindahl_index(positions: &[PositionSnapshot], portfolio_value: f64) -> f64 {
    if portfolio_value <= 0.0 || positions.is_empty() {
        return 0.0;
    }
    positions
        .iter()
        .map(|p| {
            let share = p.value() / portfolio_value;
            share * share
        })
        .sum::<f64>()
        * 100.0
}

/// Largest single position value as a percentage of portfolio value.
pub fn largest_position_pct(positions: &[PositionSnapshot], portfolio_value: f64) -> f64 {
    if portfolio_value <= 0.0 {
        return 0.0;
    }
    positions
        .iter()
        .map(PositionSnapshot::value)
        .fold(0.0, f64::max)
        / portfolio_value
        * 100.0
}
