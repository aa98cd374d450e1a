/// Which built-in distance/norm pair a run should use, or that the caller is
/// supplying its own closures to [`crate::train`].
///
/// The training core itself never inspects this enum — it only documents, at
/// the call site, which of the built-ins in [`crate::metric`] a [`TrainConfig`]
/// corresponds to. There is no registry or dynamic dispatch here; it's
/// informational metadata a caller can match on when constructing the
/// closures it passes to `train`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// L2 distance, no normalization.
    #[default]
    Euclidean,
    /// Angular distance with L2-norm spherical normalization.
    Angular,
    /// Caller-supplied distance/norm closures.
    Custom,
}

/// Run-level configuration for [`crate::train`]: the memory budget, iteration
/// cap, RNG seed, and metric selection a caller needs to fix before training.
///
/// There is no file- or environment-based configuration surface: this crate
/// is a library call, not a service, so `TrainConfig` is always constructed
/// programmatically by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Absolute cap on `ElkanKmeans` scratch memory, in bytes.
    pub mem_budget_bytes: usize,
    /// Maximum number of Lloyd iterations, in case convergence is never
    /// reached exactly.
    pub max_iterations: usize,
    /// Seed for the owned `rand::rngs::SmallRng`-backed [`crate::Random`]
    /// source, for deterministic, reproducible training.
    pub seed: u64,
    /// Which built-in metric this run is configured for.
    pub metric: Metric,
}

impl TrainConfig {
    /// Default iteration cap: generous enough to reach convergence on
    /// well-conditioned inputs without risking an unbounded loop on
    /// pathological ones.
    pub const DEFAULT_MAX_ITERATIONS: usize = 500;

    /// A config with the default iteration cap and Euclidean metric, for the
    /// given memory budget and seed.
    pub fn new(mem_budget_bytes: usize, seed: u64) -> Self {
        Self {
            mem_budget_bytes,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            seed,
            metric: Metric::Euclidean,
        }
    }

    /// Builder: overrides the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Builder: overrides the metric selection.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }
}
