use std::collections::VecDeque;

use crate::config::VOLUME_WINDOW;
use crate::sim::RandomSource;
use crate::types::VolumeSample;

/// Label given to every sample appended after seeding.
pub const LATEST_HOUR: &str = "24h";

// (scale, offset) per field: value = floor(u * scale + offset)
const TOTAL: (f64, f64) = (800_000.0, 400_000.0);
const REV_U: (f64, f64) = (300_000.0, 80_000.0);
const NOICE: (f64, f64) = (200_000.0, 40_000.0);
const FARVILLE: (f64, f64) = (150_000.0, 30_000.0);

/// Fixed 24-sample window, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSeries {
    samples: VecDeque<VolumeSample>,
}

impl VolumeSeries {
    pub fn seeded(rng: &mut dyn RandomSource) -> Self {
        let samples = (0..VOLUME_WINDOW)
            .map(|i| draw_sample(format!("{i}h"), rng))
            .collect();
        Self { samples }
    }

    /// Returns `None` unless exactly `VOLUME_WINDOW` samples are given.
    pub fn from_samples(samples: Vec<VolumeSample>) -> Option<Self> {
        (samples.len() == VOLUME_WINDOW).then(|| Self { samples: samples.into() })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &VolumeSample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<VolumeSample> {
        self.samples.iter().cloned().collect()
    }

    /// Drop the oldest sample and append a fresh "24h" one.
    /// Draw order: total, rev_u, noice, farville.
    pub fn shift_append(&mut self, rng: &mut dyn RandomSource) {
        self.samples.pop_front();
        self.samples.push_back(draw_sample(LATEST_HOUR.to_string(), rng));
    }

    pub fn total_volume(&self) -> u64 {
        self.samples.iter().map(|s| s.total).sum()
    }

    /// Busiest hour in the window.
    pub fn peak(&self) -> Option<&VolumeSample> {
        self.samples.iter().max_by_key(|s| s.total)
    }
}

fn draw_sample(hour: String, rng: &mut dyn RandomSource) -> VolumeSample {
    let mut draw = |(scale, offset): (f64, f64)| (rng.next() * scale + offset).floor() as u64;
    VolumeSample {
        hour,
        total: draw(TOTAL),
        rev_u: draw(REV_U),
        noice: draw(NOICE),
        farville: draw(FARVILLE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SeededRandom, SequenceRandom};

    fn known_series() -> VolumeSeries {
        let samples = (0..VOLUME_WINDOW as u64)
            .map(|i| VolumeSample {
                hour: format!("{i}h"),
                total: 400_000 + i,
                rev_u: 80_000 + i,
                noice: 40_000 + i,
                farville: 30_000 + i,
            })
            .collect();
        VolumeSeries::from_samples(samples).expect("24 samples")
    }

    #[test]
    fn seed_labels_and_ranges() {
        let mut rng = SeededRandom::new(5);
        let series = VolumeSeries::seeded(&mut rng);
        assert_eq!(series.len(), VOLUME_WINDOW);
        for (i, s) in series.samples().enumerate() {
            assert_eq!(s.hour, format!("{i}h"));
            assert!((400_000..1_200_000).contains(&s.total));
            assert!((80_000..380_000).contains(&s.rev_u));
            assert!((40_000..240_000).contains(&s.noice));
            assert!((30_000..180_000).contains(&s.farville));
        }
    }

    #[test]
    fn seed_uses_draws_in_field_order() {
        let mut rng = SequenceRandom::new(vec![0.5, 0.1, 0.25, 0.0]);
        let series = VolumeSeries::seeded(&mut rng);
        let first = series.samples().next().expect("sample");
        assert_eq!(first.total, 800_000);
        assert_eq!(first.rev_u, 110_000);
        assert_eq!(first.noice, 90_000);
        assert_eq!(first.farville, 30_000);
    }

    #[test]
    fn shift_append_rotates_the_window() {
        let mut series = known_series();
        let before = series.to_vec();
        let mut rng = SequenceRandom::new(vec![0.1, 0.5, 0.9, 0.2, 0.7]);

        series.shift_append(&mut rng);

        let after = series.to_vec();
        assert_eq!(after.len(), VOLUME_WINDOW);
        assert_eq!(after[0], before[1]);
        assert_eq!(after[VOLUME_WINDOW - 1].hour, "24h");
        assert_eq!(after[VOLUME_WINDOW - 1].total, 480_000);
    }

    #[test]
    fn length_holds_over_many_shifts() {
        let mut rng = SeededRandom::new(2);
        let mut series = VolumeSeries::seeded(&mut rng);
        for _ in 0..100 {
            series.shift_append(&mut rng);
            assert_eq!(series.len(), VOLUME_WINDOW);
            assert_eq!(series.samples().last().map(|s| s.hour.as_str()), Some("24h"));
        }
    }

    #[test]
    fn total_and_peak() {
        let series = known_series();
        let expected: u64 = (0..VOLUME_WINDOW as u64).map(|i| 400_000 + i).sum();
        assert_eq!(series.total_volume(), expected);
        assert_eq!(series.peak().map(|s| s.hour.as_str()), Some("23h"));
        assert!(VolumeSeries::from_samples(Vec::new()).is_none());
    }
}
