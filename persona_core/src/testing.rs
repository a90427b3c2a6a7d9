//! Test doubles shared by the unit tests of this crate.

use async_trait::async_trait;
use persona_env::{GenerativeOracle, OracleError, OracleRequest, RandomSource};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Responder = dyn Fn(&OracleRequest, usize) -> Result<String, OracleError> + Send + Sync;

/// Oracle whose replies come from a closure of (request, call number).
pub struct FnOracle {
    respond: Arc<Responder>,
    calls: AtomicUsize,
}

impl FnOracle {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&OracleRequest, usize) -> Result<String, OracleError> + Send + Sync + 'static,
    {
        Self {
            respond: Arc::new(respond),
            calls: AtomicUsize::new(0),
        }
    }

    /// An oracle that fails every call.
    pub fn failing() -> Self {
        Self::new(|_, _| Err(OracleError::transport("connection reset")))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeOracle for FnOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(&request, n)
    }

    fn name(&self) -> &str {
        "fn-oracle"
    }
}

/// Returns the same value for every uniform draw and cycles indices.
pub struct FixedSource {
    pub value: f64,
    next: usize,
}

impl FixedSource {
    pub fn new(value: f64) -> Self {
        Self { value, next: 0 }
    }
}

impl RandomSource for FixedSource {
    fn uniform(&mut self, _low: f64, _high: f64) -> f64 {
        self.value
    }

    fn index(&mut self, len: usize) -> usize {
        let i = self.next % len;
        self.next += 1;
        i
    }

    fn seed(&self) -> u64 {
        0
    }
}

/// Seeded ChaCha source for statistical tests.
pub struct SeededSource {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl RandomSource for SeededSource {
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
        self.seed
    }
}
