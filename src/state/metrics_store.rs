use crate::sim::RandomSource;
use crate::types::AppRow;

/// Display names of the tracked mini-apps, in seed rank order.
pub const APP_NAMES: [&str; 5] = ["RevU", "Noice", "Farville", "Friend.tech", "Pixel Arcade"];

/// (id, name, icon, tx/hour, new users, volume, change)
const SEED: [(&str, &str, &str, u64, u64, u64, f64); 5] = [
    ("revu", "RevU", "🎯", 2847, 342, 125_600, 24.3),
    ("noice", "Noice", "🎵", 1923, 215, 87_300, 18.7),
    ("farville", "Farville", "🚜", 1654, 189, 72_400, 12.1),
    ("friend", "Friend.tech", "👥", 1432, 156, 64_200, 8.4),
    ("pixel", "Pixel Arcade", "🎮", 987, 124, 45_800, 5.2),
];

// Per-field walk parameters: (bias, scale). Counters lean slightly upward,
// percent change is neutral.
const TX_WALK: (f64, f64) = (0.3, 100.0);
const USERS_WALK: (f64, f64) = (0.4, 20.0);
const VOLUME_WALK: (f64, f64) = (0.3, 2000.0);
const CHANGE_WALK: (f64, f64) = (0.5, 2.0);

// ---------------------------------------------------------------------------
// MetricsStore
// ---------------------------------------------------------------------------

/// Leaderboard rows. Rank is assigned once at seed time and never recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsStore {
    rows: Vec<AppRow>,
}

impl MetricsStore {
    pub fn seeded() -> Self {
        let rows = SEED
            .iter()
            .enumerate()
            .map(|(i, &(id, name, icon, tx_per_hour, new_users, volume, change))| AppRow {
                id: id.to_string(),
                name: name.to_string(),
                icon: icon.to_string(),
                tx_per_hour,
                new_users,
                volume,
                change,
                rank: i as u32 + 1,
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[AppRow] {
        &self.rows
    }

    /// One random-walk step on every row. Draw order per row: tx, users, volume, change.
    pub fn advance(&mut self, rng: &mut dyn RandomSource) {
        for row in &mut self.rows {
            row.tx_per_hour = walk_counter(row.tx_per_hour, rng.next(), TX_WALK);
            row.new_users = walk_counter(row.new_users, rng.next(), USERS_WALK);
            row.volume = walk_counter(row.volume, rng.next(), VOLUME_WALK);
            let (bias, scale) = CHANGE_WALK;
            row.change = round1(row.change + (rng.next() - bias) * scale);
        }
    }

    /// Rows ordered by current volume, highest first. Does not touch stored ranks.
    pub fn ranked_by_volume(&self) -> Vec<AppRow> {
        rank_by_volume(&self.rows)
    }
}

/// Copy of `rows` ordered by volume, highest first; ties keep seed rank order.
pub fn rank_by_volume(rows: &[AppRow]) -> Vec<AppRow> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| b.volume.cmp(&a.volume).then(a.rank.cmp(&b.rank)));
    rows
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::seeded()
    }
}

fn walk_counter(value: u64, u: f64, (bias, scale): (f64, f64)) -> u64 {
    (value as f64 + (u - bias) * scale).floor().max(0.0) as u64
}

/// Round to one decimal place, deciding from the exact binary value, so
/// `1.45` (stored as 1.4499..) rounds down to `1.4`.
pub fn round1(x: f64) -> f64 {
    format!("{x:.1}").parse().unwrap_or(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SeededRandom, SequenceRandom};

    #[test]
    fn seed_matches_leaderboard() {
        let store = MetricsStore::seeded();
        let rows = store.rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].name, "RevU");
        assert_eq!(rows[0].tx_per_hour, 2847);
        assert_eq!(rows[3].name, "Friend.tech");
        assert_eq!(rows[3].volume, 64_200);
        assert_eq!(rows[4].icon, "🎮");
        assert_eq!(rows[4].change, 5.2);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, APP_NAMES);
    }

    #[test]
    fn single_advance_on_revu() {
        let mut store = MetricsStore::seeded();
        let mut rng = SequenceRandom::new(vec![0.1, 0.5, 0.9, 0.2, 0.7]);
        store.advance(&mut rng);

        let revu = &store.rows()[0];
        assert_eq!(revu.tx_per_hour, 2827);
        assert_eq!(revu.new_users, 344);
        assert_eq!(revu.volume, 126_800);
        assert_eq!(revu.change, 23.7);
        assert_eq!(revu.rank, 1);
        assert_eq!(rng.draws(), 20, "four draws per row");
    }

    #[test]
    fn counters_clamp_at_zero() {
        let mut store = MetricsStore::seeded();
        let mut rng = SequenceRandom::new(vec![0.0]);
        for _ in 0..2_000 {
            store.advance(&mut rng);
        }
        for row in store.rows() {
            assert_eq!(row.tx_per_hour, 0, "{}", row.name);
            assert_eq!(row.new_users, 0, "{}", row.name);
            assert_eq!(row.volume, 0, "{}", row.name);
        }
    }

    #[test]
    fn ranks_and_ids_survive_many_advances() {
        let mut store = MetricsStore::seeded();
        let mut rng = SeededRandom::new(7);
        for _ in 0..500 {
            store.advance(&mut rng);
        }
        let ids: Vec<&str> = store.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["revu", "noice", "farville", "friend", "pixel"]);
        let mut ranks: Vec<u32> = store.rows().iter().map(|r| r.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, [1, 2, 3, 4, 5]);
        for row in store.rows() {
            assert_eq!(row.change, round1(row.change));
        }
    }

    #[test]
    fn round1_uses_the_stored_binary_value() {
        assert_eq!(round1(1.45), 1.4);
        assert_eq!(round1(0.35), 0.3);
        assert_eq!(round1(23.66), 23.7);
        assert_eq!(round1(-1.04), -1.0);
        assert_eq!(round1(24.3 + (0.2 - 0.5) * 2.0), 23.7);
    }

    #[test]
    fn ranked_by_volume_is_a_view() {
        let mut store = MetricsStore::seeded();
        let mut rng = SeededRandom::new(11);
        for _ in 0..50 {
            store.advance(&mut rng);
        }
        let view = store.ranked_by_volume();
        let stored: Vec<u32> = store.rows().iter().map(|r| r.rank).collect();
        assert_eq!(stored, [1, 2, 3, 4, 5]);
        assert!(view.windows(2).all(|w| w[0].volume >= w[1].volume));
    }
}
