//! Wall-clock access, injected so tests can pin timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// Human time-of-day for event descriptions.
    fn time_of_day(&self) -> String;
}

/// Real clock; time-of-day follows the local timezone, e.g. `3:04:05 PM`.
///
/// Wall time is read once at construction and advanced by a monotonic
/// `Instant`, so `now_ms` never goes backwards when the system clock is
/// stepped.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch_ms: u64,
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self::anchored(epoch_ms)
    }

    /// Start counting from `epoch_ms` instead of the current wall time.
    pub fn anchored(epoch_ms: u64) -> Self {
        Self { epoch_ms, started: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch_ms + self.started.elapsed().as_millis() as u64
    }

    fn time_of_day(&self) -> String {
        DateTime::from_timestamp_millis(self.now_ms() as i64)
            .map(|t| t.with_timezone(&Local).format("%-I:%M:%S %p").to_string())
            .unwrap_or_default()
    }
}

/// Hand-driven clock. Time-of-day is rendered as UTC `HH:MM:SS`, independent of locale.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self { now_ms: AtomicU64::new(now_ms) }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::Relaxed);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }

    fn time_of_day(&self) -> String {
        DateTime::from_timestamp_millis(self.now_ms() as i64)
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "00:00:00".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_and_formats_utc() {
        let clock = ManualClock::new(0);
        assert_eq!(clock.time_of_day(), "00:00:00");
        clock.advance(3_725_000);
        assert_eq!(clock.now_ms(), 3_725_000);
        assert_eq!(clock.time_of_day(), "01:02:05");
        clock.set(86_400_000 + 1_000);
        assert_eq!(clock.time_of_day(), "00:00:01");
    }

    #[test]
    fn system_clock_is_past_2020() {
        let clock = SystemClock::new();
        assert!(clock.now_ms() > 1_577_836_800_000);
        assert!(!clock.time_of_day().is_empty());
    }

    #[test]
    fn system_clock_counts_forward_from_its_anchor() {
        let anchor = 1_700_000_000_000;
        let clock = SystemClock::anchored(anchor);
        let mut last = clock.now_ms();
        assert!(last >= anchor);
        for _ in 0..1_000 {
            let now = clock.now_ms();
            assert!(now >= last, "{now} < {last}");
            last = now;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(clock.now_ms() >= anchor + 5);
        assert!(clock.now_ms() < anchor + 60_000);
    }
}
