use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::types::Snapshot;

static PARSE_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Parse one `/stream` text frame. Unrecognized frames are counted and dropped.
pub fn parse_snapshot_frame(raw: &str) -> Option<Snapshot> {
    match serde_json::from_str::<Snapshot>(raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            let count = PARSE_FAILURES.fetch_add(1, Ordering::Relaxed) + 1;
            if count <= 10 || count % 1000 == 0 {
                let sample: String = raw.chars().take(200).collect();
                warn!(count, "[WS PARSE] unrecognized frame ({e}): {sample}");
            }
            None
        }
    }
}

/// Frames rejected since process start.
pub fn parse_failures() -> u64 {
    PARSE_FAILURES.load(Ordering::Relaxed)
}
