use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::health::HealthState;
use crate::api::latency::AdvanceLatency;
use crate::config::TickerConfig;
use crate::state::Dashboard;
use crate::types::{Driver, Snapshot};

struct Inner {
    dashboard: Dashboard,
    version: u64,
}

/// State shared by every driver task.
struct Shared {
    inner: Mutex<Inner>,
    live: AtomicBool,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    health: Arc<HealthState>,
    latency: Arc<AdvanceLatency>,
}

impl Shared {
    /// Advance one store and publish the result while still holding the lock,
    /// so subscribers only ever see whole advances.
    fn advance(&self, driver: Driver) {
        let started = Instant::now();
        let Ok(mut inner) = self.inner.lock() else {
            warn!(driver = %driver, "dashboard lock poisoned, skipping advance");
            return;
        };
        inner.dashboard.advance(driver);
        let now_ms = inner.dashboard.now_ms();
        let version = self.publish(&mut inner);
        drop(inner);

        self.latency.record(started.elapsed());
        self.health.record_tick(driver, now_ms);
        debug!(driver = %driver, version, "advance");
    }

    fn restore_link(&self) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        inner.dashboard.restore_link();
        self.publish(&mut inner);
        info!("[LINK] feed reconnected");
    }

    fn publish(&self, inner: &mut Inner) -> u64 {
        inner.version += 1;
        let snapshot = inner
            .dashboard
            .snapshot(inner.version, self.live.load(Ordering::Relaxed));
        self.snapshot_tx.send_replace(Arc::new(snapshot));
        inner.version
    }
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Owns the dashboard and the periodic drivers that advance it.
/// Dropping or shutting down the ticker cancels every driver.
pub struct Ticker {
    shared: Arc<Shared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Ticker {
    /// Spawn one task per driver. Each first fires a full period after start.
    /// Must be called from within a tokio runtime.
    pub fn start(dashboard: Dashboard, cfg: TickerConfig) -> Arc<Self> {
        let initial = Arc::new(dashboard.snapshot(0, true));
        let (snapshot_tx, _) = watch::channel(initial);
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner { dashboard, version: 0 }),
            live: AtomicBool::new(true),
            snapshot_tx,
            health: Arc::new(HealthState::new()),
            latency: Arc::new(AdvanceLatency::new()),
        });

        let mut tasks = vec![
            tokio::spawn(drive(Arc::clone(&shared), Driver::Metrics, cfg.metrics)),
            tokio::spawn(drive(Arc::clone(&shared), Driver::Stats, cfg.stats)),
            tokio::spawn(drive(Arc::clone(&shared), Driver::Activity, cfg.activity)),
            tokio::spawn(drive(Arc::clone(&shared), Driver::Volume, cfg.volume)),
        ];
        if let Some(period) = cfg.link_check {
            tasks.push(tokio::spawn(drive_link(Arc::clone(&shared), period, cfg.link_reconnect)));
        }

        info!(
            drivers = tasks.len(),
            metrics_ms = cfg.metrics.as_millis() as u64,
            stats_ms = cfg.stats.as_millis() as u64,
            activity_ms = cfg.activity.as_millis() as u64,
            volume_ms = cfg.volume.as_millis() as u64,
            link_drops = cfg.link_check.is_some(),
            "Ticker started",
        );

        Arc::new(Self { shared, tasks: Mutex::new(tasks) })
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Run a driver's advance immediately, outside its schedule.
    pub fn advance_now(&self, driver: Driver) {
        self.shared.advance(driver);
    }

    pub fn is_live(&self) -> bool {
        self.shared.live.load(Ordering::Relaxed)
    }

    /// Pause or resume every driver. Timers keep running; paused ticks are dropped.
    pub fn set_live(&self, live: bool) {
        let previous = self.shared.live.swap(live, Ordering::Relaxed);
        if previous == live {
            return;
        }
        if let Ok(mut inner) = self.shared.inner.lock() {
            self.shared.publish(&mut inner);
        }
        info!(live, "Live updates {}", if live { "resumed" } else { "paused" });
    }

    pub fn toggle_live(&self) -> bool {
        let live = !self.is_live();
        self.set_live(live);
        live
    }

    pub fn health(&self) -> Arc<HealthState> {
        Arc::clone(&self.shared.health)
    }

    pub fn latency(&self) -> Arc<AdvanceLatency> {
        Arc::clone(&self.shared.latency)
    }

    pub fn is_running(&self) -> bool {
        self.tasks
            .lock()
            .map(|tasks| tasks.iter().any(|t| !t.is_finished()))
            .unwrap_or(false)
    }

    /// Cancel every scheduled driver. Idempotent.
    pub fn shutdown(&self) {
        let Ok(mut tasks) = self.tasks.lock() else {
            return;
        };
        if tasks.is_empty() {
            return;
        }
        for task in tasks.drain(..) {
            task.abort();
        }
        info!(version = self.latest().version, "Ticker shut down");
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

async fn drive(shared: Arc<Shared>, driver: Driver, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await; // consume immediate first tick

    loop {
        ticker.tick().await;
        if !shared.live.load(Ordering::Relaxed) {
            debug!(driver = %driver, "paused, tick dropped");
            continue;
        }
        shared.advance(driver);
    }
}

async fn drive_link(shared: Arc<Shared>, period: Duration, reconnect_after: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if !shared.live.load(Ordering::Relaxed) {
            continue;
        }
        let (dropped, now_ms) = match shared.inner.lock() {
            Ok(mut inner) => {
                let dropped = inner.dashboard.check_link();
                if dropped {
                    shared.publish(&mut inner);
                }
                (dropped, inner.dashboard.now_ms())
            }
            Err(_) => continue,
        };
        shared.health.record_tick(Driver::Link, now_ms);
        if dropped {
            warn!(reconnect_ms = reconnect_after.as_millis() as u64, "[LINK] Connection lost");
            tokio::time::sleep(reconnect_after).await;
            shared.restore_link();
        }
    }
}
