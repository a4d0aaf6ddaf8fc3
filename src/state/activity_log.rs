use std::collections::VecDeque;

use crate::config::ACTIVITY_CAPACITY;
use crate::sim::{Clock, RandomSource};
use crate::state::metrics_store::APP_NAMES;
use crate::types::{ActivityCategory, ActivityEvent};

/// Glyphs a synthetic event may carry.
pub const EVENT_ICONS: [&str; 5] = ["🎯", "🎵", "🚜", "👥", "🎮"];

/// Upper bound (exclusive) of a synthetic event value, in thousands.
const VALUE_SCALE: f64 = 500.0;

/// Spacing between the seeded events.
const SEED_SPACING_MS: u64 = 5_000;

/// Newest-first feed, capped at `ACTIVITY_CAPACITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLog {
    events: VecDeque<ActivityEvent>,
}

impl ActivityLog {
    pub fn empty() -> Self {
        Self { events: VecDeque::with_capacity(ACTIVITY_CAPACITY + 1) }
    }

    /// Five fixed events spaced five seconds apart, ending at `now`.
    pub fn seeded(now_ms: u64) -> Self {
        let seed = [
            (ActivityCategory::Trade, "RevU", "$47.2K USDC swap completed", "+$47.2K", "🎯"),
            (ActivityCategory::User, "Noice", "234 new users joined", "+234", "🎵"),
            (ActivityCategory::Milestone, "Farville", "Reached $5M transaction volume", "$5M", "🚜"),
            (ActivityCategory::Volume, "Friend.tech", "Peak hour: 1.2K transactions", "↗ 24%", "👥"),
            (ActivityCategory::Trade, "Pixel Arcade", "$12.8K game reward pool", "+$12.8K", "🎮"),
        ];
        let mut log = Self::empty();
        for (i, (category, app, description, value, icon)) in seed.into_iter().enumerate() {
            log.events.push_back(ActivityEvent {
                id: (i + 1).to_string(),
                category,
                app: app.to_string(),
                description: description.to_string(),
                value: Some(value.to_string()),
                icon: icon.to_string(),
                timestamp: now_ms.saturating_sub(i as u64 * SEED_SPACING_MS),
            });
        }
        log
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &ActivityEvent> {
        self.events.iter()
    }

    pub fn to_vec(&self) -> Vec<ActivityEvent> {
        self.events.iter().cloned().collect()
    }

    /// Prepend a synthetic event and trim to capacity.
    /// Draw order: category, app, value, icon.
    pub fn append(&mut self, rng: &mut dyn RandomSource, clock: &dyn Clock) -> &ActivityEvent {
        let now_ms = clock.now_ms();
        let category = *rng.pick(&ActivityCategory::ALL);
        let app = *rng.pick(&APP_NAMES);
        let value = (rng.next() * VALUE_SCALE).floor() as u64;
        let icon = *rng.pick(&EVENT_ICONS);

        self.push_front(ActivityEvent {
            id: now_ms.to_string(),
            category,
            app: app.to_string(),
            description: format!("Activity update at {}", clock.time_of_day()),
            value: Some(format!("{value}K")),
            icon: icon.to_string(),
            timestamp: now_ms,
        });
        &self.events[0]
    }

    fn push_front(&mut self, event: ActivityEvent) {
        self.events.push_front(event);
        self.events.truncate(ACTIVITY_CAPACITY);
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::empty()
    }
}
