//! Elkan-accelerated k-means centroid training for inverted-file vector indexes.
//!
//! This crate trains the coarse-quantizer centroids of an IVF vector index: given
//! a sample of vectors, it produces a fixed number `k` of centers suitable for
//! partitioning a search index by nearest-centroid assignment.
//!
//! ## Pipeline
//!
//! 1. **Quick path** — when the sample is too small to seed normally, emit
//!    distinct samples plus random fill ([`quick`]).
//! 2. **Seeding** — k-means++ weighted sampling, which also primes the lower-bound
//!    matrix consumed by the main loop ([`init`]).
//! 3. **Main loop** — Elkan's triangle-inequality-accelerated Lloyd iteration
//!    ([`elkan`]).
//! 4. **Validation** — post-condition checks before centers are returned to the
//!    caller ([`check`]).
//!
//! ## Core Types
//!
//! - [`VectorArray`] — fixed-capacity container of same-dimension float vectors
//! - [`TrainConfig`] — memory budget, iteration cap, seed, and metric selection
//! - [`TrainError`] — typed failure surface returned from [`train`]
//! - [`Cancellation`] — a cheap, clonable flag checked at every yield point
//!
//! ## Algorithms
//!
//! - [`quick::quick_centers`] — degenerate-case builder when `samples <= k`
//! - [`init::seed_plus_plus`] — k-means++ seeding with lower-bound priming
//! - [`elkan::ElkanKmeans`] — the accelerated Lloyd loop
//! - [`check::check_centers`] — post-condition validator
//!
//! The crate is deliberately free of I/O, persistence, and SQL glue: callers
//! collect samples and own the output container; this crate only fills it in.
mod bounds;
mod cancel;
mod check;
mod config;
mod elkan;
mod error;
mod init;
mod metric;
mod quick;
mod rng;
mod train;
mod vector;

pub use bounds::Bounds;
pub use cancel::Cancellation;
pub use config::Metric;
pub use config::TrainConfig;
pub use elkan::ElkanKmeans;
pub use error::PostconditionFailure;
pub use error::TrainError;
pub use metric::angular;
pub use metric::euclidean;
pub use metric::unit_norm;
pub use rng::Random;
pub use rng::RandomSource;
pub use train::train;
pub use vector::Vector;
pub use vector::VectorArray;

#[cfg(test)]
pub(crate) fn with_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
