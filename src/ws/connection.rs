use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::config::RECONNECT_BACKOFF_MS;
use crate::error::Result;
use crate::types::Snapshot;
use crate::ws::messages::parse_snapshot_frame;

/// Connection state shown by the TUI header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Connecting,
    Connected,
    Reconnecting { delay_ms: u64, error: Option<String> },
}

/// Receiving side of a running [`SnapshotFeed`].
#[derive(Clone)]
pub struct FeedHandle {
    pub snapshots: watch::Receiver<Option<Arc<Snapshot>>>,
    pub status: watch::Receiver<FeedStatus>,
    pub frames_received: Arc<AtomicU64>,
}

/// Keeps one WebSocket open to the server's `/stream` and republishes every
/// snapshot it receives. Reconnects with capped backoff.
pub struct SnapshotFeed {
    ws_url: String,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    status_tx: watch::Sender<FeedStatus>,
    frames_received: Arc<AtomicU64>,
}

impl SnapshotFeed {
    pub fn new(ws_url: String) -> (Self, FeedHandle) {
        let (snapshot_tx, snapshots) = watch::channel(None);
        let (status_tx, status) = watch::channel(FeedStatus::Connecting);
        let frames_received = Arc::new(AtomicU64::new(0));
        let handle = FeedHandle {
            snapshots,
            status,
            frames_received: Arc::clone(&frames_received),
        };
        let feed = Self { ws_url, snapshot_tx, status_tx, frames_received };
        (feed, handle)
    }

    pub async fn run(self) {
        let mut backoff_idx = 0usize;

        loop {
            info!("WS connecting to {}", self.ws_url);
            self.status_tx.send_replace(FeedStatus::Connecting);
            let error = match self.connect_once(&mut backoff_idx).await {
                Ok(()) => {
                    info!("WS connection closed cleanly");
                    None
                }
                Err(e) => {
                    error!("WS connection error: {e}");
                    Some(e.to_string())
                }
            };

            let delay_ms = backoff_delay_ms(backoff_idx);
            backoff_idx = (backoff_idx + 1).min(RECONNECT_BACKOFF_MS.len() - 1);

            warn!("WS reconnecting in {delay_ms}ms");
            self.status_tx.send_replace(FeedStatus::Reconnecting { delay_ms, error });
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    async fn connect_once(&self, backoff_idx: &mut usize) -> Result<()> {
        let (ws_stream, _) = connect_async(&self.ws_url).await?;
        let (mut write, mut read) = ws_stream.split();
        *backoff_idx = 0;
        self.status_tx.send_replace(FeedStatus::Connected);

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => self.handle_frame(&text),
                Ok(Message::Ping(data)) => write.send(Message::Pong(data)).await?,
                Ok(Message::Close(_)) => return Ok(()),
                Err(e) => return Err(e.into()),
                Ok(_) => {}
            }
        }
        Ok(())
    }

    fn handle_frame(&self, text: &str) {
        let total_frames = self.frames_received.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(snapshot) = parse_snapshot_frame(text) {
            debug!(version = snapshot.version, frames = total_frames, "snapshot received");
            self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
        }
    }
}

/// Backoff for the given attempt, saturating at the last configured step.
pub fn backoff_delay_ms(attempt: usize) -> u64 {
    RECONNECT_BACKOFF_MS
        .get(attempt)
        .or(RECONNECT_BACKOFF_MS.last())
        .copied()
        .unwrap_or(1_000)
}

/// `http://host:port` -> `ws://host:port/stream`.
pub fn stream_url(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{ws_base}/stream")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{router, ApiState};
    use crate::config::TickerConfig;
    use crate::sim::{ManualClock, SeededRandom};
    use crate::state::Dashboard;
    use crate::ticker::Ticker;
    use crate::types::Driver;

    #[test]
    fn stream_url_from_api_url() {
        assert_eq!(stream_url("http://localhost:3000"), "ws://localhost:3000/stream");
        assert_eq!(stream_url("https://pulse.example/"), "wss://pulse.example/stream");
    }

    #[test]
    fn backoff_saturates() {
        assert_eq!(backoff_delay_ms(0), 100);
        assert_eq!(backoff_delay_ms(4), 1_600);
        assert_eq!(backoff_delay_ms(40), 1_600);
    }

    #[tokio::test]
    async fn receives_published_snapshots() {
        let dashboard = Dashboard::new(
            Box::new(SeededRandom::new(31)),
            Arc::new(ManualClock::new(1_700_000_000_000)),
        );
        let ticker = Ticker::start(dashboard, TickerConfig::default());
        let app = router(ApiState { ticker: Arc::clone(&ticker) });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let (feed, mut handle) = SnapshotFeed::new(format!("ws://{addr}/stream"));
        let task = tokio::spawn(feed.run());

        let first = tokio::time::timeout(
            Duration::from_secs(5),
            handle.snapshots.wait_for(|s| s.is_some()),
        )
        .await
        .expect("initial snapshot in time")
        .expect("feed alive")
        .clone()
        .expect("some snapshot");
        assert_eq!(first.version, 0);
        assert_eq!(*handle.status.borrow(), FeedStatus::Connected);
        assert_eq!(ticker.health().stream_clients(), 1);

        ticker.advance_now(Driver::Metrics);
        let next = tokio::time::timeout(
            Duration::from_secs(5),
            handle.snapshots.wait_for(|s| s.as_ref().is_some_and(|s| s.version == 1)),
        )
        .await
        .expect("pushed snapshot in time")
        .expect("feed alive")
        .clone()
        .expect("some snapshot");
        assert_eq!(next.apps, ticker.latest().apps);
        assert!(handle.frames_received.load(Ordering::Relaxed) >= 2);

        task.abort();
        ticker.shutdown();
    }
}
