//! Advance latency histogram: time spent inside the dashboard lock per tick.

use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Values stored in microseconds, 1us to 10s, 3 significant figures.
pub struct AdvanceLatency {
    inner: Mutex<hdrhistogram::Histogram<u64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LatencySummary {
    pub p50_us: Option<u64>,
    pub p95_us: Option<u64>,
    pub p99_us: Option<u64>,
    pub samples: u64,
}

impl AdvanceLatency {
    pub fn new() -> Self {
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 10_000_000, 3)
            .expect("valid histogram bounds");
        Self { inner: Mutex::new(histogram) }
    }

    pub fn record(&self, d: Duration) {
        let us = (d.as_micros().min(u128::from(u64::MAX)) as u64).max(1);
        if let Ok(mut h) = self.inner.lock() {
            let _ = h.record(us);
        }
    }

    pub fn summary(&self) -> LatencySummary {
        let Ok(h) = self.inner.lock() else {
            return LatencySummary::default();
        };
        if h.len() == 0 {
            return LatencySummary::default();
        }
        LatencySummary {
            p50_us: Some(h.value_at_quantile(0.5)),
            p95_us: Some(h.value_at_quantile(0.95)),
            p99_us: Some(h.value_at_quantile(0.99)),
            samples: h.len(),
        }
    }
}

impl Default for AdvanceLatency {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_percentiles() {
        assert_eq!(AdvanceLatency::new().summary(), LatencySummary::default());
    }

    #[test]
    fn percentiles_track_samples() {
        let latency = AdvanceLatency::new();
        for us in 1..=100 {
            latency.record(Duration::from_micros(us));
        }
        let s = latency.summary();
        assert_eq!(s.samples, 100);
        let p50 = s.p50_us.expect("p50");
        let p99 = s.p99_us.expect("p99");
        assert!((49..=51).contains(&p50), "p50={p50}");
        assert!(p99 >= p50);
    }
}
