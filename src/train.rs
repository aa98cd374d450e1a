//! Driver: the one operation this crate exposes.
use crate::Cancellation;
use crate::RandomSource;
use crate::TrainConfig;
use crate::TrainError;
use crate::Vector;
use crate::VectorArray;
use crate::check::check_centers;
use crate::elkan::ElkanKmeans;
use crate::init::seed_plus_plus;
use crate::quick::quick_centers;

/// Trains `centers` (capacity `k`, empty on entry) from `samples`.
///
/// Selects [`quick_centers`] when `samples.len() <= centers.capacity()`,
/// otherwise runs k-means++ seeding followed by [`ElkanKmeans::run`]; either
/// way, [`check_centers`] validates the result before returning `Ok`.
///
/// `distance` must be a true metric (Euclidean or angular — squared distances
/// break Elkan's triangle-inequality pruning). `norm`, if supplied, is used to
/// normalize centers during training (e.g. for spherical/cosine variants).
/// `index_norm`, if supplied, is validated post-hoc by [`check_centers`] and
/// may differ from `norm` — callers sometimes train under one normalization
/// but index under another.
pub fn train<D, Nm, In, R>(
    samples: &VectorArray,
    centers: &mut VectorArray,
    distance: &D,
    norm: Option<&Nm>,
    index_norm: Option<&In>,
    config: &TrainConfig,
    rng: &mut R,
    cancel: &Cancellation,
) -> Result<(), TrainError>
where
    D: Fn(&Vector, &Vector) -> f64 + Sync,
    Nm: Fn(&Vector) -> f64,
    In: Fn(&Vector) -> f64,
    R: RandomSource,
{
    let norm_dyn = norm.map(|f| f as &dyn Fn(&Vector) -> f64);
    let index_norm_dyn = index_norm.map(|f| f as &dyn Fn(&Vector) -> f64);
    let k = centers.capacity();

    if samples.len() <= k {
        log::info!("quick path: {} samples for {k} centers", samples.len());
        quick_centers(samples, centers, norm_dyn, rng);
    } else {
        log::info!("seeding {k} centers from {} samples", samples.len());
        let (seeded, lower) = seed_plus_plus(samples, k, distance, rng, cancel)?;
        *centers = seeded;
        ElkanKmeans::run(samples, centers, lower, distance, norm_dyn, config, rng, cancel)?;
    }

    check_centers(centers, index_norm_dyn)?;
    log::info!("training complete: {} centers", centers.len());
    Ok(())
}
