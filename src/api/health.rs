//! Shared health state for the /health endpoint.
//! Updated by the ticker drivers and the snapshot stream, read by the API.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::types::Driver;

const DRIVERS: [Driver; 5] = [
    Driver::Metrics,
    Driver::Stats,
    Driver::Activity,
    Driver::Volume,
    Driver::Link,
];

/// Tick counters and stream subscriber gauge.
#[derive(Default)]
pub struct HealthState {
    /// Advances per driver, indexed like `DRIVERS`.
    ticks: [AtomicU64; 5],
    /// Millisecond timestamp of the last advance (0 = none yet).
    last_tick_at_ms: AtomicU64,
    /// Connected /stream clients.
    stream_clients: AtomicU64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverTicks {
    pub metrics: u64,
    pub stats: u64,
    pub activity: u64,
    pub volume: u64,
    pub link: u64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self, driver: Driver, at_ms: u64) {
        self.ticks[slot(driver)].fetch_add(1, Ordering::Relaxed);
        self.last_tick_at_ms.store(at_ms, Ordering::Relaxed);
    }

    pub fn ticks(&self, driver: Driver) -> u64 {
        self.ticks[slot(driver)].load(Ordering::Relaxed)
    }

    pub fn total_ticks(&self) -> u64 {
        DRIVERS.iter().map(|d| self.ticks(*d)).sum()
    }

    pub fn driver_ticks(&self) -> DriverTicks {
        DriverTicks {
            metrics: self.ticks(Driver::Metrics),
            stats: self.ticks(Driver::Stats),
            activity: self.ticks(Driver::Activity),
            volume: self.ticks(Driver::Volume),
            link: self.ticks(Driver::Link),
        }
    }

    pub fn last_tick_at_ms(&self) -> u64 {
        self.last_tick_at_ms.load(Ordering::Relaxed)
    }

    pub fn inc_stream_clients(&self) {
        self.stream_clients.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_stream_clients(&self) {
        self.stream_clients.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn stream_clients(&self) -> u64 {
        self.stream_clients.load(Ordering::Relaxed)
    }
}

fn slot(driver: Driver) -> usize {
    match driver {
        Driver::Metrics => 0,
        Driver::Stats => 1,
        Driver::Activity => 2,
        Driver::Volume => 3,
        Driver::Link => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_driver() {
        let health = HealthState::new();
        health.record_tick(Driver::Metrics, 10);
        health.record_tick(Driver::Metrics, 20);
        health.record_tick(Driver::Volume, 30);
        assert_eq!(health.ticks(Driver::Metrics), 2);
        assert_eq!(health.ticks(Driver::Stats), 0);
        assert_eq!(health.total_ticks(), 3);
        assert_eq!(health.last_tick_at_ms(), 30);
        assert_eq!(health.driver_ticks().volume, 1);
    }
}
