use rand::Rng as _;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Uniform integer and float draws needed by [`crate::quick`] and
/// [`crate::init`]. Parameterized (rather than baked in as a concrete type) so
/// tests can swap in a deterministic source and training stays reproducible
/// given the same seed.
pub trait RandomSource {
    /// Uniform integer in `[0, n)`. `n` must be positive.
    fn index(&mut self, n: usize) -> usize;

    /// Uniform double in `[0, 1)`.
    fn unit(&mut self) -> f64;
}

/// The production [`RandomSource`], backed by `rand`'s non-cryptographic
/// `SmallRng` — the same generator `krukah-robopoker` uses for its own
/// k-means++ seeding (`crates/rbp-clustering/src/layer.rs::init_kmeans`).
#[derive(Debug, Clone)]
pub struct Random(SmallRng);

impl Random {
    /// Builds a deterministic source from an explicit seed, for reproducible
    /// training runs and tests.
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Builds a source seeded from the wall clock, for production callers
    /// that don't need reproducibility.
    pub fn from_entropy() -> Self {
        use std::hash::Hash;
        use std::hash::Hasher;
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time moves forward")
            .hash(&mut hasher);
        Self::seeded(hasher.finish())
    }
}

impl RandomSource for Random {
    fn index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "index() requires a non-empty range");
        self.0.random_range(0..n)
    }

    fn unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}
