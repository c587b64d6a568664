//! Randomness behind a seam so allocation and jitter are testable.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of randomness for vote allocation and delay jitter.
pub trait Randomizer: Send + Sync {
    /// A uniform sample from [0, 1).
    fn uniform01(&self) -> f64;

    /// A non-negative whole-second sample with the given mean, drawn from
    /// an exponential-like distribution (geometric jitter).
    fn geometric(&self, mean: f64) -> u64 {
        if mean <= 0.0 {
            return 0;
        }
        let u = self.uniform01();
        (-mean * (1.0 - u).ln()).floor() as u64
    }
}

/// Operating-system randomness.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandomizer;

impl Randomizer for OsRandomizer {
    fn uniform01(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Deterministic randomness for tests.
#[derive(Debug)]
pub struct SeededRandomizer {
    rng: Mutex<StdRng>,
}

impl SeededRandomizer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Randomizer for SeededRandomizer {
    fn uniform01(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .gen::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform01_in_range() {
        let r = OsRandomizer;
        for _ in 0..1_000 {
            let u = r.uniform01();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let a = SeededRandomizer::new(7);
        let b = SeededRandomizer::new(7);
        for _ in 0..10 {
            assert_eq!(a.uniform01(), b.uniform01());
        }
    }

    #[test]
    fn test_geometric_zero_mean() {
        assert_eq!(OsRandomizer.geometric(0.0), 0);
    }

    #[test]
    fn test_geometric_mean_is_close() {
        let r = SeededRandomizer::new(42);
        let samples = 20_000;
        let total: u64 = (0..samples).map(|_| r.geometric(45.0)).sum();
        let mean = total as f64 / samples as f64;
        // Flooring shaves roughly half a second off the continuous mean.
        assert!((mean - 44.5).abs() < 2.0, "observed mean {mean}");
    }
}
