use std::time::Duration;

use crate::error::{AppError, Result};

pub const API_URL: &str = "http://localhost:3000";

/// Leaderboard perturbation period.
pub const METRICS_INTERVAL_MS: u64 = 3_000;

/// Headline tile refresh period.
pub const STATS_INTERVAL_MS: u64 = 4_000;

/// Activity feed append period.
pub const ACTIVITY_INTERVAL_MS: u64 = 4_000;

/// Volume chart shift period.
pub const VOLUME_INTERVAL_MS: u64 = 5_000;

/// How often the simulated feed link rolls for a drop.
pub const LINK_CHECK_INTERVAL_MS: u64 = 15_000;

/// How long a simulated link drop lasts before reconnecting.
pub const LINK_RECONNECT_MS: u64 = 2_000;

/// A link check drops the feed when its draw exceeds this.
pub const LINK_DROP_THRESHOLD: f64 = 0.95;

/// Maximum events kept in the activity feed.
pub const ACTIVITY_CAPACITY: usize = 10;

/// Fixed window of the volume chart, one sample per hour.
pub const VOLUME_WINDOW: usize = 24;

/// Default time-to-live for the local-storage cache helper.
pub const CACHE_TTL_MS: u64 = 60_000;

/// Channel capacity for the storage write-behind queue.
pub const CHANNEL_CAPACITY: usize = 1024;

/// TUI health poll period (seconds).
pub const HEALTH_POLL_SECS: u64 = 5;

/// TUI feed reconnect backoff values in milliseconds.
pub const RECONNECT_BACKOFF_MS: &[u64] = &[100, 200, 400, 800, 1_600];

/// Driver periods for the ticker. Tests shrink these.
#[derive(Debug, Clone)]
pub struct TickerConfig {
    pub metrics: Duration,
    pub stats: Duration,
    pub activity: Duration,
    pub volume: Duration,
    /// `None` disables the simulated link drops entirely.
    pub link_check: Option<Duration>,
    pub link_reconnect: Duration,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            metrics: Duration::from_millis(METRICS_INTERVAL_MS),
            stats: Duration::from_millis(STATS_INTERVAL_MS),
            activity: Duration::from_millis(ACTIVITY_INTERVAL_MS),
            volume: Duration::from_millis(VOLUME_INTERVAL_MS),
            link_check: None,
            link_reconnect: Duration::from_millis(LINK_RECONNECT_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub api_port: u16,
    /// Fixed RNG seed (PULSE_SEED). Unset means seed from entropy.
    pub seed: Option<u64>,
    /// Simulate occasional feed drops (PULSE_SIMULATE_LINK_DROPS)
    pub simulate_link_drops: bool,
    /// Snapshot server base URL used by the TUI (API_URL)
    pub api_url: String,
    /// SQLite file backing the TUI local storage (CACHE_DB_PATH)
    pub cache_db_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            seed: match std::env::var("PULSE_SEED") {
                Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                    AppError::Config("PULSE_SEED must be an unsigned integer".to_string())
                })?),
                Err(_) => None,
            },
            simulate_link_drops: std::env::var("PULSE_SIMULATE_LINK_DROPS")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            api_url: std::env::var("API_URL").unwrap_or_else(|_| API_URL.to_string()),
            cache_db_path: std::env::var("CACHE_DB_PATH")
                .unwrap_or_else(|_| "pulse-cache.db".to_string()),
        })
    }

    pub fn ticker(&self) -> TickerConfig {
        TickerConfig {
            link_check: self
                .simulate_link_drops
                .then(|| Duration::from_millis(LINK_CHECK_INTERVAL_MS)),
            ..TickerConfig::default()
        }
    }
}
