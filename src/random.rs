// Randomness source behind every simulated delay and pick

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

pub trait RandomSource: Send {
    /// Uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform index into a collection of `len` items. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize {
        let idx = (self.next_f64() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }
}

/// Entropy-seeded generator for real sessions.
pub struct ThreadRandom {
    rng: StdRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        ThreadRandom { rng: StdRng::from_entropy() }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Reproducible generator.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom { rng: StdRng::seed_from_u64(seed) }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of values, then keeps returning 0.0.
#[derive(Debug, Default, Clone)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        ScriptedRandom { values: values.into_iter().collect() }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.values
            .pop_front()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .unwrap_or(0.0)
    }
}

/// Half-open delay range `[min_ms, max_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        DelayRange { min_ms, max_ms }
    }

    pub fn sample(&self, rng: &mut dyn RandomSource) -> Duration {
        let span = self.max_ms.saturating_sub(self.min_ms);
        let offset = (rng.next_f64() * span as f64) as u64;
        Duration::from_millis(self.min_ms + offset.min(span.saturating_sub(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_range_stays_half_open() {
        let range = DelayRange::new(2000, 5000);
        let mut rng = ScriptedRandom::new([0.0, 0.5, 0.999_999_9]);

        assert_eq!(range.sample(&mut rng), Duration::from_millis(2000));
        assert_eq!(range.sample(&mut rng), Duration::from_millis(3500));
        let top = range.sample(&mut rng);
        assert!(top < Duration::from_millis(5000), "got {:?}", top);
    }

    #[test]
    fn test_pick_index_bounds() {
        let mut rng = ScriptedRandom::new([0.0, 0.25, 0.99]);
        assert_eq!(rng.pick_index(4), 0);
        assert_eq!(rng.pick_index(4), 1);
        assert_eq!(rng.pick_index(4), 3);
    }

    #[test]
    fn test_scripted_values_then_zero() {
        let mut rng = ScriptedRandom::new([0.5]);
        rng.push(1.5);
        assert_eq!(rng.remaining(), 2);

        assert_eq!(rng.next_f64(), 0.5);
        // Out-of-range values are pulled back under 1.0
        assert!(rng.next_f64() < 1.0);
        assert_eq!(rng.remaining(), 0);
        assert_eq!(rng.next_f64(), 0.0);
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..10 {
            let x = a.next_f64();
            assert_eq!(x, b.next_f64());
            assert!((0.0..1.0).contains(&x));
        }
    }
}
