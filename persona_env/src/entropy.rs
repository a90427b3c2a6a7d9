//! Production implementation of RandomSource using OS entropy.

use crate::RandomSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Production random source seeded from OS entropy.
///
/// Runs are not reproducible; use a seeded source for tests.
pub struct EntropySource {
    rng: StdRng,
}

impl EntropySource {
    /// Creates a new EntropySource.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropySource {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_uniform_in_range() {
        let mut source = EntropySource::new();
        for _ in 0..100 {
            let x = source.uniform(0.8, 1.2);
            assert!((0.8..1.2).contains(&x));
        }
        assert_eq!(source.uniform(2.0, 2.0), 2.0);
    }

    #[test]
    fn test_entropy_index_in_range() {
        let mut source = EntropySource::new();
        for _ in 0..100 {
            assert!(source.index(3) < 3);
        }
    }

    #[test]
    fn test_entropy_seed() {
        assert_eq!(EntropySource::new().seed(), 0);
    }
}
