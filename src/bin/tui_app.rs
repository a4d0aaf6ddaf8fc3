use std::sync::Arc;

use onchain_pulse::api::routes::HealthResponse;
use onchain_pulse::cache::{Cached, PollState};
use onchain_pulse::sim::SystemClock;
use onchain_pulse::state::BadgeState;
use onchain_pulse::types::{Badge, Snapshot};
use onchain_pulse::ws::FeedStatus;

/// Local storage key for the cached badge table.
pub const BADGES_CACHE_KEY: &str = "pulse:badges";

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Volume,
    Badges,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Overview, Tab::Volume, Tab::Badges];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Volume => "Volume",
            Tab::Badges => "Badges",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Overview => 0,
            Tab::Volume => 1,
            Tab::Badges => 2,
        }
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub tab: Tab,
    pub snapshot: Option<Arc<Snapshot>>,
    pub feed_status: FeedStatus,
    pub health: PollState<HealthResponse>,
    pub badges: Option<BadgeState>,
    pub badges_from_cache: bool,
    pub badges_error: Option<String>,
    /// One-line message shown in the footer (last action result).
    pub notice: Option<String>,
    pub base_url: String,
    pub clock: SystemClock,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            tab: Tab::Overview,
            snapshot: None,
            feed_status: FeedStatus::Connecting,
            health: PollState::default(),
            badges: None,
            badges_from_cache: false,
            badges_error: None,
            notice: None,
            base_url,
            clock: SystemClock::new(),
        }
    }

    /// Keep the last good badge table when a refetch fails.
    pub fn apply_badges(&mut self, cached: Cached<Vec<Badge>>) {
        match cached.data {
            Some(badges) => {
                self.badges = Some(BadgeState::from_badges(badges));
                self.badges_from_cache = cached.from_cache;
                self.badges_error = None;
            }
            None => {
                self.badges_error = cached.error.map(|e| e.to_string());
            }
        }
    }

    pub fn live(&self) -> Option<bool> {
        self.snapshot.as_ref().map(|s| s.live)
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Compact dollar amount: `$1.25M`, `$126.8K`, `$950`.
pub fn format_usd(v: u64) -> String {
    if v >= 1_000_000 {
        format!("${:.2}M", v as f64 / 1_000_000.0)
    } else if v >= 1_000 {
        format!("${:.1}K", v as f64 / 1_000.0)
    } else {
        format!("${v}")
    }
}

/// Thousands separators: `12,450`.
pub fn format_count(v: u64) -> String {
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_change(pct: f64) -> String {
    if pct >= 0.0 {
        format!("+{pct:.1}%")
    } else {
        format!("{pct:.1}%")
    }
}

pub fn format_age(secs: u64) -> String {
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3_599 => format!("{}m ago", secs / 60),
        _ => format!("{}h ago", secs / 3_600),
    }
}

/// Text progress bar, `width` cells wide.
pub fn progress_bar(progress: u8, width: usize) -> String {
    let filled = (usize::from(progress.min(100)) * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
