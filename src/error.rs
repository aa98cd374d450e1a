//! Typed error surface returned from [`crate::train`].
//!
//! All errors are fatal to the training call; there is no partial-success
//! contract. Scratch buffers are released on every exit path by ordinary
//! `Drop`, so no variant carries cleanup state.

/// Which post-condition on the finished centers was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PostconditionFailure {
    #[error("fewer than numCenters distinct centers were produced")]
    NotEnoughCenters,
    #[error("a center coordinate is NaN")]
    Nan,
    #[error("a center coordinate is infinite")]
    Infinity,
    #[error("two centers are byte-equal")]
    Duplicate,
    #[error("a center has zero norm under the index-level norm function")]
    ZeroNorm,
}

/// Errors returned to the caller of [`crate::train`].
///
/// Every variant is fatal: training does not resume or retry internally on any
/// of these. [`TrainError::Cancelled`] is the one exception to the "this is a
/// bug" framing below — it is an expected, quietly-propagated outcome.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TrainError {
    /// The scratch memory required by `ElkanKmeans` exceeds the configured
    /// budget. Raised before any allocation happens.
    #[error("training requires {required_mb} MiB, which exceeds the {budget_mb} MiB budget")]
    BudgetExceeded { required_mb: u64, budget_mb: u64 },

    /// `numCenters * numCenters` would overflow the 32-bit signed indexing
    /// arithmetic used for the inter-center distance matrix.
    #[error("numCenters = {num_centers} is too large: numCenters^2 would overflow 32-bit indexing")]
    DimensionOverflow { num_centers: usize },

    /// The input vectors are not of a type this core supports.
    #[error("unsupported vector type")]
    UnsupportedType,

    /// A post-condition failed on the finished centers.
    ///
    /// Reported as a bug: it means the numerics drifted into an invalid state.
    /// The expected response is to retry with a different seed or flag the
    /// dataset, not to patch the result.
    #[error("post-condition violated: {0}")]
    PostconditionViolated(#[from] PostconditionFailure),

    /// Training was cancelled via [`crate::Cancellation`]. Expected, and
    /// logged at `debug`, not `warn`/`error`.
    #[error("training cancelled")]
    Cancelled,
}
