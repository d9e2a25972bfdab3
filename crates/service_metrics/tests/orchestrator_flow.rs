//! End-to-end orchestration flows over the in-memory store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use infra_lock::{LockManager, LockStatsCollector};
use infra_store::MemoryStore;
use risk_engine::drawdown::ValuePoint;
use risk_engine::{
    PositionSide, PositionSnapshot, RiskMetricsSnapshot, SubjectId, TenantId, VarMethod, VarParams,
};
use service_metrics::{
    Collaborators, LimitKind, LimitsProvider, MetricsError, NotificationSink, PositionProvider,
    ProviderError, RiskEvent, RiskFreeRateProvider, RiskLimit, RiskMetricsService,
    RiskServiceConfig, SnapshotHistory, WalletProvider,
};

#[derive(Default)]
struct FakePositions {
    positions: Mutex<Vec<PositionSnapshot>>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

#[async_trait]
impl PositionProvider for FakePositions {
    async fn list_open_positions(
        &self,
        _subject: &SubjectId,
        _tenant: &TenantId,
    ) -> Result<Vec<PositionSnapshot>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::new("positions", "connection reset"));
        }
        Ok(self.positions.lock().unwrap().clone())
    }
}

struct FakeWallet {
    cash: f64,
    margin: f64,
    fail: AtomicBool,
}

impl FakeWallet {
    fn new(cash: f64, margin: f64) -> Self {
        Self {
            cash,
            margin,
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn cash_balance(
        &self,
        _subject: &SubjectId,
        _tenant: &TenantId,
    ) -> Result<f64, ProviderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::new("wallet", "timeout"));
        }
        Ok(self.cash)
    }

    async fn margin_available(
        &self,
        _subject: &SubjectId,
        _tenant: &TenantId,
    ) -> Result<f64, ProviderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::new("wallet", "timeout"));
        }
        Ok(self.margin)
    }
}

struct FakeRates(f64);

#[async_trait]
impl RiskFreeRateProvider for FakeRates {
    async fn current_rate(&self) -> Result<f64, ProviderError> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct FakeHistory {
    values: Mutex<Vec<ValuePoint>>,
    snapshots: Mutex<Vec<RiskMetricsSnapshot>>,
}

#[async_trait]
impl SnapshotHistory for FakeHistory {
    async fn append(&self, snapshot: &RiskMetricsSnapshot) -> Result<(), ProviderError> {
        self.values
            .lock()
            .unwrap()
            .push(ValuePoint::new(snapshot.calculated_at, snapshot.portfolio_value));
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    async fn value_history(
        &self,
        _subject: &SubjectId,
        _tenant: &TenantId,
        limit: usize,
    ) -> Result<Vec<ValuePoint>, ProviderError> {
        let values = self.values.lock().unwrap();
        let start = values.len().saturating_sub(limit);
        Ok(values[start..].to_vec())
    }

    async fn recent(
        &self,
        _subject: &SubjectId,
        _tenant: &TenantId,
        limit: usize,
    ) -> Result<Vec<RiskMetricsSnapshot>, ProviderError> {
        let snapshots = self.snapshots.lock().unwrap();
        let start = snapshots.len().saturating_sub(limit);
        Ok(snapshots[start..].to_vec())
    }
}

#[derive(Default)]
struct FakeLimits {
    limits: Mutex<Vec<RiskLimit>>,
    calls: AtomicUsize,
}

#[async_trait]
impl LimitsProvider for FakeLimits {
    async fn limits_for(
        &self,
        _subject: &SubjectId,
        _tenant: &TenantId,
    ) -> Result<Vec<RiskLimit>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.limits.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct FakeSink {
    events: Mutex<Vec<RiskEvent>>,
}

#[async_trait]
impl NotificationSink for FakeSink {
    async fn publish(&self, event: RiskEvent) -> Result<(), ProviderError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    positions: Arc<FakePositions>,
    wallet: Arc<FakeWallet>,
    history: Arc<FakeHistory>,
    limits: Arc<FakeLimits>,
    sink: Arc<FakeSink>,
    service: Arc<RiskMetricsService<MemoryStore>>,
}

fn harness_with_config(config: RiskServiceConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let positions = Arc::new(FakePositions::default());
    let wallet = Arc::new(FakeWallet::new(60_000.0, 40_000.0));
    let history = Arc::new(FakeHistory::default());
    let limits = Arc::new(FakeLimits::default());
    let sink = Arc::new(FakeSink::default());

    let collab = Collaborators {
        positions: positions.clone(),
        wallets: wallet.clone(),
        rates: Arc::new(FakeRates(0.04)),
        history: history.clone(),
        limits: limits.clone(),
        notifications: Some(sink.clone()),
    };
    let service = Arc::new(
        RiskMetricsService::new(
            Arc::clone(&store),
            collab,
            config,
            Arc::new(LockStatsCollector::new()),
        )
        .unwrap(),
    );

    Harness {
        store,
        positions,
        wallet,
        history,
        limits,
        sink,
        service,
    }
}

fn harness() -> Harness {
    harness_with_config(RiskServiceConfig {
        lock_base_delay_ms: 5,
        lock_max_attempts: 20,
        ..Default::default()
    })
}

fn ids() -> (SubjectId, TenantId) {
    (SubjectId::new("u1"), TenantId::new("t1"))
}

fn long_position(price: f64, qty: f64) -> PositionSnapshot {
    PositionSnapshot::new(PositionSide::Long, price, qty, 0.0, 0.0)
}

#[tokio::test]
async fn compute_once_then_serve_from_cache() {
    let h = harness();
    let (subject, tenant) = ids();
    h.positions.positions.lock().unwrap().push(long_position(100.0, 100.0));

    let first = h.service.get_or_compute_metrics(&subject, &tenant).await.unwrap();
    let second = h.service.get_or_compute_metrics(&subject, &tenant).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.positions.calls.load(Ordering::SeqCst), 1, "second call was a cache hit");
    assert_eq!(h.history.snapshots.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_callers_compute_exactly_once() {
    let h = harness();
    let (subject, tenant) = ids();
    h.positions.positions.lock().unwrap().push(long_position(50.0, 10.0));

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let service = Arc::clone(&h.service);
        let subject = subject.clone();
        let tenant = tenant.clone();
        tasks.push(tokio::spawn(async move {
            service.get_or_compute_metrics(&subject, &tenant).await.unwrap()
        }));
    }
    let mut snapshots = Vec::new();
    for task in tasks {
        snapshots.push(task.await.unwrap());
    }

    // Losers of the lock race must pick up the winner's cached result.
    assert_eq!(h.positions.calls.load(Ordering::SeqCst), 1);
    for snapshot in &snapshots[1..] {
        assert_eq!(snapshot, &snapshots[0]);
    }
}

#[tokio::test]
async fn held_lock_surfaces_retryable_error() {
    let h = harness_with_config(RiskServiceConfig {
        lock_max_attempts: 2,
        lock_base_delay_ms: 5,
        ..Default::default()
    });
    let (subject, tenant) = ids();

    // A foreign process holds the subject's metrics lock.
    let foreign = LockManager::new(
        Arc::clone(&h.store),
        Default::default(),
        Arc::new(LockStatsCollector::new()),
    );
    let _held = foreign.acquire(subject.as_str(), tenant.as_str(), "metrics").await.unwrap();

    let err = h.service.get_or_compute_metrics(&subject, &tenant).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, MetricsError::LockUnavailable { .. }));
    // Nothing was computed or cached.
    assert_eq!(h.positions.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upstream_failure_degrades_to_defaults() {
    let h = harness();
    let (subject, tenant) = ids();
    h.positions.fail.store(true, Ordering::SeqCst);
    h.wallet.fail.store(true, Ordering::SeqCst);

    let snapshot = h.service.get_or_compute_metrics(&subject, &tenant).await.unwrap();
    assert_eq!(snapshot.portfolio_value, 0.0);
    assert_eq!(snapshot.exposure.gross, 0.0);
    // Zero portfolio value defaults leverage to 1.
    assert_eq!(snapshot.leverage, 1.0);
}

#[tokio::test]
async fn limit_breach_reaches_the_sink() {
    let h = harness();
    let (subject, tenant) = ids();
    // 4x gross leverage against a tight limit.
    h.positions.positions.lock().unwrap().push(long_position(400.0, 1_000.0));
    h.limits
        .limits
        .lock()
        .unwrap()
        .push(RiskLimit::new("lev-cap", LimitKind::MaxLeverage, 2.0));

    let snapshot = h.service.get_or_compute_metrics(&subject, &tenant).await.unwrap();
    assert!(snapshot.leverage > 2.0);

    // Dispatch is fire-and-forget on a detached task.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let events = h.sink.events.lock().unwrap();
    assert!(!events.is_empty(), "expected a limit breach event");
}

#[tokio::test]
async fn limits_cache_invalidation_refetches_provider() {
    let h = harness();
    let (subject, tenant) = ids();

    h.service.limits_for(&subject, &tenant).await.unwrap();
    h.service.limits_for(&subject, &tenant).await.unwrap();
    assert_eq!(h.limits.calls.load(Ordering::SeqCst), 1, "second read was cached");

    // A limit mutation invalidates synchronously; the next read refetches.
    h.service.limits_changed(&subject, &tenant).await.unwrap();
    h.service.limits_for(&subject, &tenant).await.unwrap();
    assert_eq!(h.limits.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn teardown_clears_cached_objects() {
    let h = harness();
    let (subject, tenant) = ids();
    h.positions.positions.lock().unwrap().push(long_position(10.0, 10.0));

    h.service.get_or_compute_metrics(&subject, &tenant).await.unwrap();
    let deleted = h.service.teardown(&subject, &tenant).await.unwrap();
    assert!(deleted >= 1);

    // Next request recomputes.
    h.service.get_or_compute_metrics(&subject, &tenant).await.unwrap();
    assert_eq!(h.positions.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn var_needs_thirty_observations() {
    let h = harness();
    let (subject, tenant) = ids();

    let err = h
        .service
        .calculate_var(&subject, &tenant, VarParams::default_historical())
        .await
        .unwrap_err();
    assert!(matches!(err, MetricsError::InsufficientData { need: 30, .. }));
}

#[tokio::test]
async fn var_computes_and_caches_per_params() {
    let h = harness();
    let (subject, tenant) = ids();

    // Seed 61 days of history by hand: zig-zag values around 100k.
    {
        let mut values = h.history.values.lock().unwrap();
        let start = chrono::Utc::now() - chrono::Duration::days(61);
        for day in 0..61 {
            let wiggle = if day % 2 == 0 { 1.0 } else { -1.0 };
            values.push(ValuePoint::new(
                start + chrono::Duration::days(day),
                100_000.0 + 2_000.0 * wiggle * (day % 5) as f64,
            ));
        }
    }

    let params = VarParams::default_historical();
    let first = h.service.calculate_var(&subject, &tenant, params).await.unwrap();
    assert!(first.value > 0.0);
    assert_eq!(first.method, VarMethod::Historical);

    // Same params hit the cache; different params recompute.
    let again = h.service.calculate_var(&subject, &tenant, params).await.unwrap();
    assert_eq!(first, again);

    let stricter = VarParams {
        confidence: 0.99,
        ..params
    };
    let harder = h.service.calculate_var(&subject, &tenant, stricter).await.unwrap();
    assert!(harder.value >= first.value);
}

#[tokio::test]
async fn monte_carlo_var_runs_over_positions() {
    let h = harness();
    let (subject, tenant) = ids();
    h.positions.positions.lock().unwrap().push(long_position(100.0, 300.0));

    let config = risk_engine::MonteCarloConfig {
        simulations: 2_000,
        horizon_days: 1.0,
        antithetic: true,
        seed: Some(42),
    };
    let result = h
        .service
        .calculate_monte_carlo_var(&subject, &tenant, config)
        .await
        .unwrap();

    assert_eq!(result.simulations_run, 2_000);
    assert!(result.var_95 > 0.0);
    assert!(result.var_99 >= result.var_95);
}

#[tokio::test]
async fn profile_builds_from_appended_history() {
    let h = harness();
    let (subject, tenant) = ids();
    h.positions.positions.lock().unwrap().push(long_position(20.0, 100.0));

    // No history yet: profile is insufficient data.
    let err = h.service.get_or_compute_profile(&subject, &tenant).await.unwrap_err();
    assert!(matches!(err, MetricsError::InsufficientData { .. }));

    h.service.get_or_compute_metrics(&subject, &tenant).await.unwrap();
    let profile = h.service.get_or_compute_profile(&subject, &tenant).await.unwrap();
    assert_eq!(profile.observed_snapshots, 1);
    assert!(profile.recommended_max_leverage > 0.0);
}

#[tokio::test]
async fn run_exclusive_is_exposed_for_other_resources() {
    let h = harness();
    let (subject, tenant) = ids();

    let outcome = h
        .service
        .run_exclusive(&subject, &tenant, "rebalance", || async {
            Ok::<_, std::convert::Infallible>(7)
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome, 7);
    assert_eq!(h.service.lock_stats().acquired, 1);
    assert_eq!(h.service.lock_stats().released, 1);
}
