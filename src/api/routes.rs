use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::health::DriverTicks;
use crate::api::latency::LatencySummary;
use crate::api::stream::stream_snapshots;
use crate::state::metrics_store::rank_by_volume;
use crate::ticker::Ticker;
use crate::types::{ActivityEvent, AppRow, Badge, LinkStatus, Snapshot, StatTile, VolumeSample};

#[derive(Clone)]
pub struct ApiState {
    pub ticker: Arc<Ticker>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/snapshot", get(get_snapshot))
        .route("/apps", get(get_apps))
        .route("/stats", get(get_stats))
        .route("/activity", get(get_activity))
        .route("/volume", get(get_volume))
        .route("/badges", get(get_badges))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .route("/live/toggle", post(toggle_live))
        .route("/stream", get(stream_snapshots))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AppsQuery {
    /// `volume` orders by live volume; anything else keeps seed rank order.
    pub order: Option<String>,
}

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct BadgesQuery {
    /// `earned` or `in_progress`.
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct VolumeResponse {
    pub samples: Vec<VolumeSample>,
    pub total_volume: u64,
    pub peak: Option<VolumeSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub live: bool,
    pub running: bool,
    pub link: LinkStatus,
    pub version: u64,
    pub generated_at_ms: u64,
    pub ticks: DriverTicks,
    pub total_ticks: u64,
    pub last_tick_at_ms: u64,
    pub stream_clients: u64,
    pub advance_p99_us: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LiveResponse {
    pub live: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_snapshot(State(state): State<ApiState>) -> Json<Snapshot> {
    Json(Snapshot::clone(&state.ticker.latest()))
}

async fn get_apps(
    State(state): State<ApiState>,
    Query(params): Query<AppsQuery>,
) -> Json<Vec<AppRow>> {
    let snapshot = state.ticker.latest();
    let rows = match params.order.as_deref() {
        Some("volume") => rank_by_volume(&snapshot.apps),
        _ => snapshot.apps.clone(),
    };
    Json(rows)
}

async fn get_stats(State(state): State<ApiState>) -> Json<Vec<StatTile>> {
    Json(state.ticker.latest().stats.clone())
}

async fn get_activity(
    State(state): State<ApiState>,
    Query(params): Query<ActivityQuery>,
) -> Json<Vec<ActivityEvent>> {
    let snapshot = state.ticker.latest();
    let limit = params.limit.unwrap_or(snapshot.activity.len());
    Json(snapshot.activity.iter().take(limit).cloned().collect())
}

async fn get_volume(State(state): State<ApiState>) -> Json<VolumeResponse> {
    let snapshot = state.ticker.latest();
    let peak = snapshot.volume.iter().max_by_key(|s| s.total).cloned();
    Json(VolumeResponse {
        samples: snapshot.volume.clone(),
        total_volume: snapshot.total_volume,
        peak,
    })
}

async fn get_badges(
    State(state): State<ApiState>,
    Query(params): Query<BadgesQuery>,
) -> Json<Vec<Badge>> {
    let snapshot = state.ticker.latest();
    let badges = snapshot
        .badges
        .iter()
        .filter(|b| match params.status.as_deref() {
            Some("earned") => b.earned,
            Some("in_progress") => !b.earned,
            _ => true,
        })
        .cloned()
        .collect();
    Json(badges)
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let ticker = &state.ticker;
    let snapshot = ticker.latest();
    let health = ticker.health();
    Json(HealthResponse {
        live: ticker.is_live(),
        running: ticker.is_running(),
        link: snapshot.link.clone(),
        version: snapshot.version,
        generated_at_ms: snapshot.generated_at_ms,
        ticks: health.driver_ticks(),
        total_ticks: health.total_ticks(),
        last_tick_at_ms: health.last_tick_at_ms(),
        stream_clients: health.stream_clients(),
        advance_p99_us: ticker.latency().summary().p99_us,
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencySummary> {
    Json(state.ticker.latency().summary())
}

async fn toggle_live(State(state): State<ApiState>) -> Json<LiveResponse> {
    Json(LiveResponse { live: state.ticker.toggle_live() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TickerConfig;
    use crate::sim::{ManualClock, SeededRandom};
    use crate::state::Dashboard;
    use crate::types::Driver;

    async fn serve() -> (String, Arc<Ticker>) {
        let dashboard = Dashboard::new(
            Box::new(SeededRandom::new(21)),
            Arc::new(ManualClock::new(1_700_000_000_000)),
        );
        let ticker = Ticker::start(dashboard, TickerConfig::default());
        let app = router(ApiState { ticker: Arc::clone(&ticker) });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), ticker)
    }

    #[tokio::test]
    async fn snapshot_and_panels() {
        let (base, ticker) = serve().await;
        ticker.advance_now(Driver::Activity);

        let snap: Snapshot = reqwest::get(format!("{base}/snapshot"))
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(snap.version, 1);
        assert_eq!(snap.activity.len(), 6);

        let activity: Vec<ActivityEvent> = reqwest::get(format!("{base}/activity?limit=2"))
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0], snap.activity[0]);

        let earned: Vec<Badge> = reqwest::get(format!("{base}/badges?status=earned"))
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(earned.len(), 4);

        let volume: VolumeResponse = reqwest::get(format!("{base}/volume"))
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(volume.samples.len(), 24);
        assert_eq!(volume.total_volume, volume.samples.iter().map(|s| s.total).sum::<u64>());

        ticker.shutdown();
    }

    #[tokio::test]
    async fn apps_by_volume() {
        let (base, ticker) = serve().await;
        let apps: Vec<AppRow> = reqwest::get(format!("{base}/apps?order=volume"))
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(apps.len(), 5);
        assert!(apps.windows(2).all(|w| w[0].volume >= w[1].volume));
        ticker.shutdown();
    }

    #[tokio::test]
    async fn toggle_and_health() {
        let (base, ticker) = serve().await;
        let client = reqwest::Client::new();

        let toggled: LiveResponse = client
            .post(format!("{base}/live/toggle"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert!(!toggled.live);
        assert!(!ticker.is_live());

        let health: HealthResponse = client
            .get(format!("{base}/health"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert!(!health.live);
        assert!(health.running);
        assert_eq!(health.version, 1, "pause publishes once");
        assert_eq!(health.total_ticks, 0);

        ticker.shutdown();
    }
}
