//! `/stream`: pushes the full snapshot to a WebSocket client on every publish.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::routes::ApiState;
use crate::types::Snapshot;

pub async fn stream_snapshots(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(move |socket| push_snapshots(socket, state))
}

async fn push_snapshots(mut socket: WebSocket, state: ApiState) {
    let health = state.ticker.health();
    let mut rx = state.ticker.subscribe();
    health.inc_stream_clients();
    info!(clients = health.stream_clients(), "stream client connected");

    loop {
        let snapshot = rx.borrow_and_update().clone();
        let text = match serde_json::to_string(&*snapshot) {
            Ok(text) => text,
            Err(e) => {
                warn!("snapshot serialization failed: {e}");
                break;
            }
        };
        if socket.send(Message::Text(text)).await.is_err() {
            break;
        }
        debug!(version = snapshot.version, "snapshot pushed");
        if !wait_for_change(&mut rx, &mut socket).await {
            break;
        }
    }

    health.dec_stream_clients();
    info!(clients = health.stream_clients(), "stream client disconnected");
}

/// Returns false once the client goes away or the publisher is gone.
async fn wait_for_change(rx: &mut watch::Receiver<Arc<Snapshot>>, socket: &mut WebSocket) -> bool {
    loop {
        tokio::select! {
            changed = rx.changed() => return changed.is_ok(),
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return false,
                Some(Ok(_)) => {}
            },
        }
    }
}
