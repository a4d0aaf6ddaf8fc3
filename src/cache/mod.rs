//! Opportunistic TTL cache over local storage, plus a cancellable poller.
//!
//! A cache entry occupies two keys: `key` holds the JSON value and `key:time`
//! the millisecond timestamp it was written at.

pub mod poller;

pub use poller::{PollState, Poller};

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::CACHE_TTL_MS;
use crate::error::{AppError, Result};
use crate::sim::Clock;
use crate::storage::LocalStorage;

#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub key: String,
    pub ttl: Duration,
}

impl CacheOptions {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), ttl: Duration::from_millis(CACHE_TTL_MS) }
    }

    /// A zero ttl means "use the default".
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn effective_ttl(&self) -> Duration {
        if self.ttl.is_zero() {
            Duration::from_millis(CACHE_TTL_MS)
        } else {
            self.ttl
        }
    }

    fn time_key(&self) -> String {
        format!("{}:time", self.key)
    }
}

/// Outcome of a cached fetch. A fetch failure leaves `data` empty and the
/// stored entry untouched.
#[derive(Debug)]
pub struct Cached<T> {
    pub data: Option<T>,
    pub error: Option<AppError>,
    pub from_cache: bool,
}

/// Return the stored value if it is younger than the TTL, otherwise run
/// `fetcher` once and store its result. Fetch errors are not retried.
pub async fn cached_fetch<T, F, Fut>(
    storage: &dyn LocalStorage,
    clock: &dyn Clock,
    opts: &CacheOptions,
    fetcher: F,
) -> Cached<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(value) = read_fresh(storage, opts, clock.now_ms()) {
        debug!(key = %opts.key, "cache hit");
        return Cached { data: Some(value), error: None, from_cache: true };
    }

    match fetcher().await {
        Ok(value) => {
            store(storage, opts, &value, clock.now_ms());
            Cached { data: Some(value), error: None, from_cache: false }
        }
        Err(e) => {
            warn!(key = %opts.key, "cached fetch failed: {e}");
            Cached { data: None, error: Some(e), from_cache: false }
        }
    }
}

fn read_fresh<T: DeserializeOwned>(storage: &dyn LocalStorage, opts: &CacheOptions, now_ms: u64) -> Option<T> {
    let data = storage.get_item(&opts.key).ok().flatten()?;
    let written_at = storage.get_item(&opts.time_key()).ok().flatten()?;
    let written_at: u64 = written_at.trim().parse().ok()?;

    if now_ms.saturating_sub(written_at) >= opts.effective_ttl().as_millis() as u64 {
        return None;
    }
    serde_json::from_str(&data).ok()
}

fn store<T: Serialize>(storage: &dyn LocalStorage, opts: &CacheOptions, value: &T, now_ms: u64) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(key = %opts.key, "cache value not serializable: {e}");
            return;
        }
    };
    if let Err(e) = storage.set_item(&opts.key, json) {
        warn!(key = %opts.key, "cache write skipped: {e}");
        return;
    }
    if let Err(e) = storage.set_item(&opts.time_key(), now_ms.to_string()) {
        warn!(key = %opts.key, "cache timestamp write skipped: {e}");
    }
}
