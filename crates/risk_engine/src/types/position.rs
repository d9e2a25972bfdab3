//! Read-only position view consumed by the risk engine.
//!
//! Positions are supplied by an external position collaborator; the engine
//! never loads or mutates them itself.

use serde::{Deserialize, Serialize};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    /// Long exposure: gains when the price rises.
    Long,
    /// Short exposure: gains when the price falls.
    Short,
}

/// Minimal read-only view of one open position.
///
/// # Examples
///
/// ```rust
/// use risk_engine::types::{PositionSide, PositionSnapshot};
///
/// let pos = PositionSnapshot::new(PositionSide::Long, 50.0, 10.0, 25.0, 0.0);
/// assert_eq!(pos.value(), 500.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// Position direction.
    pub side: PositionSide,
    /// Current mark price of the instrument.
    pub current_price: f64,
    /// Quantity still open.
    pub remaining_quantity: f64,
    /// Unrealized profit and loss.
    pub unrealized_pnl: f64,
    /// Realized profit and loss.
    pub realized_pnl: f64,
}

impl PositionSnapshot {
    /// Creates a new position snapshot.
    pub fn new(
        side: PositionSide,
        current_price: f64,
        remaining_quantity: f64,
        unrealized_pnl: f64,
        realized_pnl: f64,
    ) -> Self {
        Self {
            side,
            current_price,
            remaining_quantity,
            unrealized_pnl,
            realized_pnl,
        }
    }

    /// Notional value of the open quantity at the current price.
    #[inline]
    pub fn value(&self) -> f64 {
        self.current_price * self.remaining_quantity
    }
}
