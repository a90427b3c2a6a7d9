//! Injectable random source shared by all simulators.

/// Source of every random draw the simulators make.
///
/// Diffusion jitter and bootstrap resampling both go through this trait so
/// a single seeded implementation makes a whole pipeline run reproducible.
///
/// # Implementations
///
/// - **Production**: `EntropySource` - OS-seeded `StdRng`
/// - **Simulation**: `SimContext` in `persona_sim` - `ChaCha8Rng(seed)`
pub trait RandomSource: Send {
    /// Draws a value uniformly from `[low, high)`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Draws an index uniformly from `0..len`.
    ///
    /// `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;

    /// Returns the seed (0 when not seeded).
    fn seed(&self) -> u64;
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (**self).uniform(low, high)
    }

    fn index(&mut self, len: usize) -> usize {
        (**self).index(len)
    }

    fn seed(&self) -> u64 {
        (**self).seed()
    }
}
