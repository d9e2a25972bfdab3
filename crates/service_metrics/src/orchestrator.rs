//! The metrics orchestrator.
//!
//! Per request: check the result cache; on a miss take the subject's
//! lock, re-check the cache under the lock (another process may have
//! finished while this one waited), compute, write the cache, release.
//! Lock contention surfaces as a typed retry-later error; the engine is
//! never run unprotected.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use infra_lock::{LockManager, LockStats, LockStatsCollector, DEFAULT_RESOURCE};
use infra_store::SharedStore;
use risk_engine::engine::{compute_snapshot, daily_returns_from_values, SnapshotInputs};
use risk_engine::mc::{FactorExposure, MonteCarloEngine, RiskFactorModel, StdRandomSource};
use risk_engine::{
    math, MonteCarloConfig, MonteCarloVarResult, PositionSide, RiskLevel, RiskMetricsSnapshot,
    SubjectId, TenantId, VarMethod, VarParams, VarResult, MIN_OBSERVATIONS,
};

use crate::cache::{CacheKind, ResultCache};
use crate::config::RiskServiceConfig;
use crate::error::MetricsError;
use crate::limits::{evaluate_limits, LimitsProvider, RiskLimit};
use crate::profile::{build_profile, RiskProfile};
use crate::providers::{
    NotificationSink, PositionProvider, RiskEvent, RiskEventKind, RiskFreeRateProvider,
    SnapshotHistory, WalletProvider,
};

/// Lock resource serialising VaR computation.
pub const RESOURCE_VAR: &str = "var";
/// Lock resource serialising Monte Carlo simulation.
pub const RESOURCE_MONTE_CARLO: &str = "montecarlo";
/// Lock resource serialising profile classification.
pub const RESOURCE_PROFILE: &str = "profile";

/// Injected collaborator set.
///
/// Every collaborator is an interface supplied at construction; the
/// service builds none of its own.
pub struct Collaborators {
    /// Open-position source.
    pub positions: Arc<dyn PositionProvider>,
    /// Wallet balance source.
    pub wallets: Arc<dyn WalletProvider>,
    /// Risk-free rate source.
    pub rates: Arc<dyn RiskFreeRateProvider>,
    /// Append-only snapshot history.
    pub history: Arc<dyn SnapshotHistory>,
    /// Configured limit source.
    pub limits: Arc<dyn LimitsProvider>,
    /// Optional fire-and-forget event sink.
    pub notifications: Option<Arc<dyn NotificationSink>>,
}

/// Cache-aside, lock-guarded risk metrics service.
///
/// The entry points mirror the produced interface: metrics, VaR,
/// Monte Carlo VaR, profile, plus the exclusive-section wrapper for
/// modules needing the same guarantee on another resource.
pub struct RiskMetricsService<S: SharedStore> {
    cache: ResultCache<S>,
    locks: LockManager<S>,
    collab: Collaborators,
    config: RiskServiceConfig,
}

impl<S: SharedStore> RiskMetricsService<S> {
    /// Creates the service over a shared store with injected
    /// collaborators and stats collector.
    pub fn new(
        store: Arc<S>,
        collab: Collaborators,
        config: RiskServiceConfig,
        stats: Arc<LockStatsCollector>,
    ) -> Result<Self, MetricsError> {
        config
            .validate()
            .map_err(|e| MetricsError::Config(e.to_string()))?;
        let cache = ResultCache::new(Arc::clone(&store));
        let locks = LockManager::new(store, config.lock_config(), stats);
        Ok(Self {
            cache,
            locks,
            collab,
            config,
        })
    }

    /// Current lock statistics.
    pub fn lock_stats(&self) -> LockStats {
        self.locks.stats().snapshot()
    }

    /// Returns the subject's current metrics, computing them under the
    /// subject lock on a cache miss.
    ///
    /// # Errors
    ///
    /// - [`MetricsError::LockUnavailable`] on contention; retry later
    /// - [`MetricsError::Computation`] if the engine faulted; nothing was
    ///   cached
    pub async fn get_or_compute_metrics(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<RiskMetricsSnapshot, MetricsError> {
        if let Some(hit) = self
            .cache
            .get::<RiskMetricsSnapshot>(CacheKind::Metrics, subject, tenant)
            .await
        {
            debug!(subject = %subject, "metrics cache hit");
            return Ok(hit);
        }

        let outcome = self
            .locks
            .run_exclusive(subject.as_str(), tenant.as_str(), DEFAULT_RESOURCE, || async {
                // Another process may have finished while this one was
                // retrying acquisition.
                if let Some(hit) = self
                    .cache
                    .get::<RiskMetricsSnapshot>(CacheKind::Metrics, subject, tenant)
                    .await
                {
                    debug!(subject = %subject, "metrics cached while waiting for lock");
                    return Ok(hit);
                }
                self.compute_and_store(subject, tenant).await
            })
            .await;

        match outcome {
            Ok(inner) => inner,
            Err(lock) => Err(lock.into()),
        }
    }

    /// Computes VaR for the subject with the given parameters.
    ///
    /// Historical and parametric requests are cache-aside under the `Var`
    /// kind; a cached result is only reused when its parameters match.
    /// Monte Carlo requests delegate to the simulation path.
    pub async fn calculate_var(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
        params: VarParams,
    ) -> Result<VarResult, MetricsError> {
        if params.method == VarMethod::MonteCarlo {
            return self.monte_carlo_as_var(subject, tenant, params).await;
        }

        if let Some(hit) = self.cached_var_matching(subject, tenant, &params).await {
            return Ok(hit);
        }

        let outcome = self
            .locks
            .run_exclusive(subject.as_str(), tenant.as_str(), RESOURCE_VAR, || async {
                if let Some(hit) = self.cached_var_matching(subject, tenant, &params).await {
                    return Ok(hit);
                }

                let inputs = self.gather_inputs(subject, tenant).await;
                let portfolio_value =
                    inputs.cash_balance + inputs.margin_available
                        + inputs.positions.iter().map(|p| p.unrealized_pnl).sum::<f64>();

                let result = match params.method {
                    VarMethod::Historical => risk_engine::historical_var(
                        &inputs.daily_returns,
                        portfolio_value,
                        params.confidence,
                        params.horizon_days,
                    )?,
                    VarMethod::Parametric => risk_engine::parametric_var(
                        &inputs.daily_returns,
                        portfolio_value,
                        params.confidence,
                        params.horizon_days,
                    )?,
                    VarMethod::MonteCarlo => unreachable!("handled above"),
                };

                if let Err(err) = self.cache.put(CacheKind::Var, subject, tenant, &result).await {
                    warn!(subject = %subject, error = %err, "VaR cache write skipped");
                }
                Ok(result)
            })
            .await;

        match outcome {
            Ok(inner) => inner,
            Err(lock) => Err(lock.into()),
        }
    }

    /// Runs a Monte Carlo VaR simulation with factors derived from the
    /// subject's current positions and return history.
    pub async fn calculate_monte_carlo_var(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
        config: MonteCarloConfig,
    ) -> Result<MonteCarloVarResult, MetricsError> {
        let outcome = self
            .locks
            .run_exclusive(
                subject.as_str(),
                tenant.as_str(),
                RESOURCE_MONTE_CARLO,
                || async {
                    let inputs = self.gather_inputs(subject, tenant).await;
                    let portfolio_value = inputs.cash_balance
                        + inputs.margin_available
                        + inputs.positions.iter().map(|p| p.unrealized_pnl).sum::<f64>();
                    let exposures = self.derive_exposures(&inputs, portfolio_value);
                    self.run_simulation(&exposures, portfolio_value, config)
                },
            )
            .await;

        match outcome {
            Ok(inner) => inner,
            Err(lock) => Err(lock.into()),
        }
    }

    /// Monte Carlo VaR over caller-supplied factor models, for callers
    /// that know their risk drivers better than position-derived
    /// defaults.
    pub async fn monte_carlo_with_exposures(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
        exposures: Vec<FactorExposure>,
        config: MonteCarloConfig,
    ) -> Result<MonteCarloVarResult, MetricsError> {
        let outcome = self
            .locks
            .run_exclusive(
                subject.as_str(),
                tenant.as_str(),
                RESOURCE_MONTE_CARLO,
                || async {
                    let inputs = self.gather_inputs(subject, tenant).await;
                    let portfolio_value = inputs.cash_balance
                        + inputs.margin_available
                        + inputs.positions.iter().map(|p| p.unrealized_pnl).sum::<f64>();
                    self.run_simulation(&exposures, portfolio_value, config)
                },
            )
            .await;

        match outcome {
            Ok(inner) => inner,
            Err(lock) => Err(lock.into()),
        }
    }

    /// Returns the subject's risk profile, classifying recent snapshot
    /// history under the profile lock on a cache miss.
    pub async fn get_or_compute_profile(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<RiskProfile, MetricsError> {
        if let Some(hit) = self
            .cache
            .get::<RiskProfile>(CacheKind::Profile, subject, tenant)
            .await
        {
            return Ok(hit);
        }

        let outcome = self
            .locks
            .run_exclusive(subject.as_str(), tenant.as_str(), RESOURCE_PROFILE, || async {
                if let Some(hit) = self
                    .cache
                    .get::<RiskProfile>(CacheKind::Profile, subject, tenant)
                    .await
                {
                    return Ok(hit);
                }

                let history = self
                    .collab
                    .history
                    .recent(subject, tenant, self.config.history_window)
                    .await
                    .map_err(|e| MetricsError::Upstream {
                        provider: e.provider,
                        message: e.message,
                    })?;
                let profile = build_profile(subject, tenant, &history, Utc::now())?;

                if let Err(err) = self
                    .cache
                    .put(CacheKind::Profile, subject, tenant, &profile)
                    .await
                {
                    warn!(subject = %subject, error = %err, "profile cache write skipped");
                }
                Ok(profile)
            })
            .await;

        match outcome {
            Ok(inner) => inner,
            Err(lock) => Err(lock.into()),
        }
    }

    /// Runs `f` exclusively for the subject on an arbitrary resource
    /// name, exposing the lock manager's guarantee to other modules.
    pub async fn run_exclusive<T, E, F, Fut>(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
        resource: &str,
        f: F,
    ) -> Result<Result<T, E>, MetricsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.locks
            .run_exclusive(subject.as_str(), tenant.as_str(), resource, f)
            .await
            .map_err(MetricsError::from)
    }

    /// The subject's configured limits, cache-aside under the `Limits`
    /// kind.
    pub async fn limits_for(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<Vec<RiskLimit>, MetricsError> {
        if let Some(hit) = self
            .cache
            .get::<Vec<RiskLimit>>(CacheKind::Limits, subject, tenant)
            .await
        {
            return Ok(hit);
        }
        let limits = self
            .collab
            .limits
            .limits_for(subject, tenant)
            .await
            .map_err(|e| MetricsError::Upstream {
                provider: e.provider,
                message: e.message,
            })?;
        if let Err(err) = self.cache.put(CacheKind::Limits, subject, tenant, &limits).await {
            warn!(subject = %subject, error = %err, "limits cache write skipped");
        }
        Ok(limits)
    }

    /// Synchronous invalidation hook for limit write paths. Any
    /// component mutating the subject's limit set must call this before
    /// reporting success.
    pub async fn limits_changed(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<(), MetricsError> {
        self.cache
            .invalidate(CacheKind::Limits, subject, tenant)
            .await?;
        Ok(())
    }

    /// Drops every cached object for the subject. Session-teardown hook;
    /// best-effort across keys.
    pub async fn teardown(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<usize, MetricsError> {
        Ok(self.cache.invalidate_all(subject, tenant).await?)
    }

    /// Best-effort teardown across many subjects of one tenant.
    pub async fn batch_teardown(&self, subjects: &[SubjectId], tenant: &TenantId) -> usize {
        self.cache.batch_invalidate(subjects, tenant).await
    }

    // ---- internals -----------------------------------------------------

    /// Gathers engine inputs, degrading each failed collaborator to
    /// zero/defaults with a warning. Upstream trouble must not abort the
    /// whole computation.
    async fn gather_inputs(&self, subject: &SubjectId, tenant: &TenantId) -> SnapshotInputs {
        let positions = match self.collab.positions.list_open_positions(subject, tenant).await {
            Ok(positions) => positions,
            Err(err) => {
                warn!(subject = %subject, error = %err, "position provider degraded to empty");
                Vec::new()
            }
        };
        let cash_balance = match self.collab.wallets.cash_balance(subject, tenant).await {
            Ok(cash) => cash,
            Err(err) => {
                warn!(subject = %subject, error = %err, "wallet cash degraded to 0");
                0.0
            }
        };
        let margin_available = match self.collab.wallets.margin_available(subject, tenant).await {
            Ok(margin) => margin,
            Err(err) => {
                warn!(subject = %subject, error = %err, "wallet margin degraded to 0");
                0.0
            }
        };
        let risk_free_rate = match self.collab.rates.current_rate().await {
            Ok(rate) => rate,
            Err(err) => {
                warn!(error = %err, "risk-free rate degraded to 0");
                0.0
            }
        };
        let value_history = match self
            .collab
            .history
            .value_history(subject, tenant, self.config.history_window)
            .await
        {
            Ok(history) => history,
            Err(err) => {
                warn!(subject = %subject, error = %err, "snapshot history degraded to empty");
                Vec::new()
            }
        };
        let values: Vec<f64> = value_history.iter().map(|p| p.value).collect();
        let daily_returns = daily_returns_from_values(&values);

        SnapshotInputs {
            subject: subject.clone(),
            tenant: tenant.clone(),
            positions,
            cash_balance,
            margin_available,
            value_history,
            daily_returns,
            risk_free_rate,
        }
    }

    /// Computes a snapshot, caches it, appends it to history, and
    /// dispatches threshold events. Failures past the computation itself
    /// are logged, never raised: the snapshot is already correct.
    async fn compute_and_store(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
    ) -> Result<RiskMetricsSnapshot, MetricsError> {
        let inputs = self.gather_inputs(subject, tenant).await;
        let snapshot = compute_snapshot(&inputs, Utc::now())?;
        info!(
            subject = %subject,
            score = snapshot.overall_risk_score,
            level = ?snapshot.risk_level,
            "risk metrics computed"
        );

        if let Err(err) = self
            .cache
            .put(CacheKind::Metrics, subject, tenant, &snapshot)
            .await
        {
            warn!(subject = %subject, error = %err, "metrics cache write skipped");
        }
        if let Err(err) = self.collab.history.append(&snapshot).await {
            warn!(subject = %subject, error = %err, "snapshot history append skipped");
        }

        let limits = match self.limits_for(subject, tenant).await {
            Ok(limits) => limits,
            Err(err) => {
                warn!(subject = %subject, error = %err, "limit evaluation skipped");
                Vec::new()
            }
        };
        self.dispatch_events(&snapshot, &limits);

        Ok(snapshot)
    }

    /// Fire-and-forget event dispatch on a detached task. Sink failures
    /// are logged and never affect the computation result.
    fn dispatch_events(&self, snapshot: &RiskMetricsSnapshot, limits: &[RiskLimit]) {
        let Some(sink) = self.collab.notifications.as_ref() else {
            return;
        };

        let mut events: Vec<RiskEvent> = evaluate_limits(snapshot, limits)
            .into_iter()
            .map(|violation| RiskEvent {
                subject: snapshot.subject.clone(),
                tenant: snapshot.tenant.clone(),
                kind: RiskEventKind::LimitBreached { violation },
            })
            .collect();
        if snapshot.risk_level == RiskLevel::Critical {
            events.push(RiskEvent {
                subject: snapshot.subject.clone(),
                tenant: snapshot.tenant.clone(),
                kind: RiskEventKind::RiskLevelCritical {
                    score: snapshot.overall_risk_score,
                },
            });
        }
        if events.is_empty() {
            return;
        }

        let sink = Arc::clone(sink);
        tokio::spawn(async move {
            for event in events {
                if let Err(err) = sink.publish(event).await {
                    warn!(error = %err, "notification dropped");
                }
            }
        });
    }

    /// Cached VaR result, reused only when its parameters match the
    /// request.
    async fn cached_var_matching(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
        params: &VarParams,
    ) -> Option<VarResult> {
        let hit = self
            .cache
            .get::<VarResult>(CacheKind::Var, subject, tenant)
            .await?;
        let matches = hit.method == params.method
            && (hit.confidence - params.confidence).abs() < 1e-9
            && (hit.horizon_days - params.horizon_days).abs() < 1e-9;
        matches.then_some(hit)
    }

    /// Serves a `calculate_var` request through the simulation engine.
    async fn monte_carlo_as_var(
        &self,
        subject: &SubjectId,
        tenant: &TenantId,
        params: VarParams,
    ) -> Result<VarResult, MetricsError> {
        let config = self.config.monte_carlo_config(params.horizon_days);
        let mc = self.calculate_monte_carlo_var(subject, tenant, config).await?;

        let (value, cvar) = if (params.confidence - 0.95).abs() < 1e-9 {
            (mc.var_95, mc.cvar_95)
        } else if (params.confidence - 0.99).abs() < 1e-9 {
            (mc.var_99, mc.cvar_99)
        } else if (params.confidence - 0.999).abs() < 1e-9 {
            (mc.var_999, mc.cvar_999)
        } else {
            return Err(MetricsError::Computation(format!(
                "monte carlo VaR reports 95/99/99.9% confidence, got {}",
                params.confidence
            )));
        };

        Ok(VarResult {
            value,
            cvar: Some(cvar),
            confidence: params.confidence,
            horizon_days: params.horizon_days,
            method: VarMethod::MonteCarlo,
            portfolio_value: mc.portfolio_value,
        })
    }

    /// Derives one simulated factor per open position. Volatility and
    /// drift come from the subject's own return history when there is
    /// enough of it, otherwise from configured fallbacks.
    fn derive_exposures(&self, inputs: &SnapshotInputs, portfolio_value: f64) -> Vec<FactorExposure> {
        if portfolio_value <= 0.0 {
            return Vec::new();
        }
        let (volatility, drift) = if inputs.daily_returns.len() >= MIN_OBSERVATIONS {
            (
                math::std_dev(&inputs.daily_returns),
                math::mean(&inputs.daily_returns),
            )
        } else {
            (self.config.mc_fallback_volatility, 0.0)
        };

        inputs
            .positions
            .iter()
            .enumerate()
            .map(|(i, position)| {
                let sign = match position.side {
                    PositionSide::Long => 1.0,
                    PositionSide::Short => -1.0,
                };
                let weight = sign * position.value() / portfolio_value;
                let model =
                    RiskFactorModel::normal(format!("position-{}", i), position.current_price, volatility, drift)
                        .with_correlation(self.config.mc_market_correlation);
                FactorExposure::new(model, weight)
            })
            .collect()
    }

    fn run_simulation(
        &self,
        exposures: &[FactorExposure],
        portfolio_value: f64,
        config: MonteCarloConfig,
    ) -> Result<MonteCarloVarResult, MetricsError> {
        let engine = MonteCarloEngine::new(config)?;
        let mut source = match config.seed {
            Some(seed) => StdRandomSource::from_seed(seed),
            None => StdRandomSource::from_entropy(),
        };
        Ok(engine.run(exposures, portfolio_value, &mut source)?)
    }
}
