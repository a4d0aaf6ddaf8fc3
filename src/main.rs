use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use onchain_pulse::api::{router, ApiState};
use onchain_pulse::config::Config;
use onchain_pulse::error::Result;
use onchain_pulse::sim::{RandomSource, SeededRandom, SystemClock};
use onchain_pulse::state::Dashboard;
use onchain_pulse::ticker::Ticker;
use onchain_pulse::types::{ActivityEvent, Snapshot};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Dashboard setup ---
    let rng: Box<dyn RandomSource> = match cfg.seed {
        Some(seed) => {
            info!(seed, "Seeding dashboard deterministically");
            Box::new(SeededRandom::new(seed))
        }
        None => Box::new(SeededRandom::from_entropy()),
    };
    let dashboard = Dashboard::new(rng, Arc::new(SystemClock::new()));
    let ticker = Ticker::start(dashboard, cfg.ticker());

    // --- Activity consumer: mirrors new feed events into the log ---
    let rx = ticker.subscribe();
    tokio::spawn(async move { activity_consumer(rx).await });

    // --- HTTP API ---
    let app = router(ApiState { ticker: Arc::clone(&ticker) });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ticker.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        return;
    }
    info!("Shutdown requested");
}

/// Logs every activity event the first time it appears in a published snapshot.
async fn activity_consumer(mut rx: watch::Receiver<Arc<Snapshot>>) {
    let mut newest_seen = rx.borrow_and_update().activity.first().map(|e| e.id.clone());

    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        let fresh: Vec<&ActivityEvent> = snapshot
            .activity
            .iter()
            .take_while(|e| Some(&e.id) != newest_seen.as_ref())
            .collect();
        for event in fresh.iter().rev() {
            log_activity(event);
        }
        if let Some(first) = snapshot.activity.first() {
            newest_seen = Some(first.id.clone());
        }
    }
}

fn log_activity(e: &ActivityEvent) {
    let value = e.value.as_deref().unwrap_or("-");
    info!(
        event = "ACTIVITY",
        id = %e.id,
        category = %e.category,
        app = %e.app,
        value,
        "ACTIVITY | {} | {} | {} | {}",
        e.app, e.category, value, e.description,
    );
}
