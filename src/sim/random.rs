//! Uniform randomness behind a trait so the simulation can be replayed exactly.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform real generator over `[0, 1)`.
pub trait RandomSource: Send {
    fn next(&mut self) -> f64;

    /// Integer in `[lo, hi)`. Returns `lo` for an empty range.
    fn next_int(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        let span = hi.abs_diff(lo);
        let offset = ((self.next() * span as f64).floor() as u64).min(span - 1);
        lo.wrapping_add_unsigned(offset)
    }
}

impl dyn RandomSource + '_ {
    /// Uniform pick. Panics on an empty slice.
    pub fn pick<'a, T>(&mut self, xs: &'a [T]) -> &'a T {
        let idx = self.next_int(0, xs.len() as i64) as usize;
        &xs[idx]
    }
}

// ---------------------------------------------------------------------------
// SeededRandom
// ---------------------------------------------------------------------------

/// ChaCha8-backed source. Same seed, same stream.
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: ChaCha8Rng::from_entropy() }
    }
}

impl RandomSource for SeededRandom {
    fn next(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

// ---------------------------------------------------------------------------
// SequenceRandom
// ---------------------------------------------------------------------------

/// Replays a fixed cycle of scalars. An empty cycle yields 0.0 forever.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self { values: values.into(), cursor: 0 }
    }

    /// Draws consumed so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceRandom {
    fn next(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_cycles() {
        let mut rng = SequenceRandom::new(vec![0.1, 0.5, 0.9]);
        let drawn: Vec<f64> = (0..5).map(|_| rng.next()).collect();
        assert_eq!(drawn, vec![0.1, 0.5, 0.9, 0.1, 0.5]);
        assert_eq!(rng.draws(), 5);
    }

    #[test]
    fn next_int_stays_in_half_open_range() {
        let mut rng = SequenceRandom::new(vec![0.0, 0.5, 0.999_999]);
        assert_eq!(rng.next_int(3, 7), 3);
        assert_eq!(rng.next_int(3, 7), 5);
        assert_eq!(rng.next_int(3, 7), 6);
        assert_eq!(rng.next_int(4, 4), 4);
    }

    #[test]
    fn next_int_handles_full_width_ranges() {
        let mut rng = SequenceRandom::new(vec![0.0, 0.5, 0.999_999]);
        assert_eq!(rng.next_int(i64::MIN, i64::MAX), i64::MIN);
        assert_eq!(rng.next_int(i64::MIN, i64::MAX), 0);
        let high = rng.next_int(i64::MIN, i64::MAX);
        assert!(high > 0 && high < i64::MAX, "{high}");
        assert_eq!(rng.next_int(-3, 2), -3);
    }

    #[test]
    fn pick_indexes_by_floor() {
        let names = ["a", "b", "c", "d", "e"];
        let mut rng = SequenceRandom::new(vec![0.7, 0.2]);
        let rng: &mut dyn RandomSource = &mut rng;
        assert_eq!(*rng.pick(&names), "d");
        assert_eq!(*rng.pick(&names), "b");
    }

    #[test]
    fn seeded_is_reproducible_and_in_unit_interval() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..1_000 {
            let (x, y) = (a.next(), b.next());
            assert_eq!(x.to_bits(), y.to_bits());
            assert!((0.0..1.0).contains(&x), "out of range: {x}");
        }
    }
}
