//! Collaborator interfaces consumed by the orchestrator.
//!
//! All collaborators are injected at construction; the service never
//! builds default implementations of them. Provider failures on the
//! numeric-input paths degrade to zero/default inputs with a warning
//! rather than aborting the computation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use risk_engine::drawdown::ValuePoint;
use risk_engine::{PositionSnapshot, RiskMetricsSnapshot, SubjectId, TenantId};

use crate::limits::LimitViolation;

/// A collaborator could not serve a request.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{provider} unavailable: {message}")]
pub struct ProviderError {
    /// Collaborator name, e.g. "positions".
    pub provider: String,
    /// Failure description.
    pub message: String,
}

impl ProviderError {
    /// Creates a provider error.
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Supplies open positions for a subject.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Lists the subject's open positions.
    async fn list_open_positions(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<Vec<PositionSnapshot>, ProviderError>;
}

/// Supplies wallet balances for a subject.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Cash balance in account currency.
    async fn cash_balance(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<f64, ProviderError>;

    /// Margin available for new positions.
    async fn margin_available(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<f64, ProviderError>;
}

/// Supplies the current annualised risk-free rate.
#[async_trait]
pub trait RiskFreeRateProvider: Send + Sync {
    /// Current annualised risk-free rate as a decimal.
    async fn current_rate(&self) -> Result<f64, ProviderError>;
}

/// Append-only snapshot history collaborator.
///
/// Snapshots are never updated in place; drawdown and return series scan
/// the appended history.
#[async_trait]
pub trait SnapshotHistory: Send + Sync {
    /// Appends a freshly computed snapshot.
    async fn append(&self, snapshot: &RiskMetricsSnapshot) -> Result<(), ProviderError>;

    /// Time-ordered portfolio values of the most recent snapshots, oldest
    /// first, at most `limit` points.
    async fn value_history(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
        limit: usize,
    ) -> Result<Vec<ValuePoint>, ProviderError>;

    /// The most recent snapshots themselves, oldest first, at most
    /// `limit` entries.
    async fn recent(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
        limit: usize,
    ) -> Result<Vec<RiskMetricsSnapshot>, ProviderError>;
}

/// Risk event pushed to the notification sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    /// Subject the event concerns.
    pub subject: SubjectId,
    /// Tenant scope.
    pub tenant: TenantId,
    /// What happened.
    pub kind: RiskEventKind,
}

/// Kinds of risk events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RiskEventKind {
    /// A configured limit was breached by the latest snapshot.
    LimitBreached {
        /// The violation details.
        violation: LimitViolation,
    },
    /// The overall score crossed into the critical band.
    RiskLevelCritical {
        /// The score that crossed the threshold.
        score: f64,
    },
}

/// Fire-and-forget event sink.
///
/// Delivery failures must never affect risk computation; the orchestrator
/// dispatches events on a detached task and only logs sink errors.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Publishes one event.
    async fn publish(&self, event: RiskEvent) -> Result<(), ProviderError>;
}
