//! Core types shared across the risk engine.

mod error;
mod ids;
mod position;
mod snapshot;

pub use error::RiskError;
pub use ids::{SubjectId, TenantId};
pub use position::{PositionSide, PositionSnapshot};
pub use snapshot::{DrawdownStats, ExposureBreakdown, RiskLevel, RiskMetricsSnapshot};
