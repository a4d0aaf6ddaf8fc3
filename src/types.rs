use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// One mini-app row on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRow {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub tx_per_hour: u64,
    pub new_users: u64,
    /// Stablecoin units.
    pub volume: u64,
    /// Percent change, one decimal.
    pub change: f64,
    /// 1-based, fixed at seed time.
    pub rank: u32,
}

// ---------------------------------------------------------------------------
// Headline tiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum StatValue {
    /// Pre-formatted constant, never refreshed.
    Text(String),
    /// Refreshable numeric slot.
    Numeric(u64),
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatValue::Text(s) => write!(f, "{s}"),
            StatValue::Numeric(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Cyan,
    Purple,
    Emerald,
    Orange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatTile {
    pub label: String,
    pub value: StatValue,
    pub change: String,
    pub accent: Accent,
}

// ---------------------------------------------------------------------------
// Activity feed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Trade,
    User,
    Milestone,
    Volume,
}

impl ActivityCategory {
    /// Pick table for synthetic events; index order is significant.
    pub const ALL: [ActivityCategory; 4] = [
        ActivityCategory::Trade,
        ActivityCategory::User,
        ActivityCategory::Milestone,
        ActivityCategory::Volume,
    ];
}

impl std::fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivityCategory::Trade => "trade",
            ActivityCategory::User => "user",
            ActivityCategory::Milestone => "milestone",
            ActivityCategory::Volume => "volume",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: String,
    pub category: ActivityCategory,
    pub app: String,
    pub description: String,
    pub value: Option<String>,
    pub icon: String,
    /// Millisecond instant at creation.
    pub timestamp: u64,
}

impl ActivityEvent {
    /// Whole seconds elapsed since the event was created.
    pub fn age_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp) / 1_000
    }
}

// ---------------------------------------------------------------------------
// Volume chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSample {
    pub hour: String,
    pub total: u64,
    pub rev_u: u64,
    pub noice: u64,
    pub farville: u64,
}

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub tier: Tier,
    pub earned: bool,
    /// Percent complete, 0..=100.
    pub progress: u8,
}

// ---------------------------------------------------------------------------
// Feed link
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LinkStatus {
    Up,
    Down { error: String },
}

impl LinkStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, LinkStatus::Up)
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkStatus::Up => write!(f, "up"),
            LinkStatus::Down { error } => write!(f, "down ({error})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot: the read-only view handed to every subscriber
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Incremented on every publish.
    pub version: u64,
    pub generated_at_ms: u64,
    pub live: bool,
    pub link: LinkStatus,
    pub apps: Vec<AppRow>,
    pub stats: Vec<StatTile>,
    /// Newest first.
    pub activity: Vec<ActivityEvent>,
    /// Oldest first.
    pub volume: Vec<VolumeSample>,
    pub total_volume: u64,
    pub badges: Vec<Badge>,
}

/// Which driver produced a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Metrics,
    Stats,
    Activity,
    Volume,
    Link,
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Driver::Metrics => "metrics",
            Driver::Stats => "stats",
            Driver::Activity => "activity",
            Driver::Volume => "volume",
            Driver::Link => "link",
        };
        write!(f, "{s}")
    }
}
