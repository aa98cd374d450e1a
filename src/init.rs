//! k-means++ seeding.
//!
//! Chooses initial centers with probability weighted by squared distance to
//! the nearest already-chosen center, and — because every candidate distance
//! is computed anyway — reuses that work to prime the lower-bound matrix
//! `ElkanKmeans` needs for its first iteration. `krukah-robopoker`'s own
//! `Layer::init_kmeans` (`crates/rbp-clustering/src/layer.rs`) runs the same
//! weighted-sampling idea via `rand::distr::weighted::WeightedIndex`; this
//! implementation inlines the prefix-subtraction walk directly instead, so
//! the same pass can also populate `lower`, which `WeightedIndex` has no
//! hook for.
use rayon::prelude::*;

use crate::Cancellation;
use crate::RandomSource;
use crate::TrainError;
use crate::Vector;
use crate::VectorArray;

/// Runs k-means++ seeding, returning `k` centers and the `numSamples x k`
/// lower-bound matrix (row-major by sample) populated as a side effect of
/// the seeding distance computations.
///
/// Invariant on return: `lower[j][i]` equals the true distance from sample
/// `j` to center `i` at the moment center `i` was seeded — a valid, tight
/// lower bound for Elkan's first iteration.
pub fn seed_plus_plus<D, R>(
    samples: &VectorArray,
    k: usize,
    distance: &D,
    rng: &mut R,
    cancel: &Cancellation,
) -> Result<(VectorArray, Vec<Vec<f32>>), TrainError>
where
    D: Fn(&Vector, &Vector) -> f64 + Sync,
    R: RandomSource,
{
    let n = samples.len();
    let dim = samples.dim();
    debug_assert!(n > 0 && k > 0);

    let mut centers = VectorArray::new(dim, k);
    centers.push(samples.get(rng.index(n)));

    let mut weight = vec![f64::INFINITY; n];
    let mut lower = vec![vec![0f32; k]; n];

    for i in 0..k {
        if cancel.requested() {
            return Err(TrainError::Cancelled);
        }
        log::debug!("seeding center {i} of {k}");

        let center_i = samples_center(&centers, i);
        let distances: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|j| distance(samples.get(j), &center_i))
            .collect();

        let mut sum = 0f64;
        for (j, &d) in distances.iter().enumerate() {
            lower[j][i] = d as f32;
            let w = d * d;
            if w < weight[j] {
                weight[j] = w;
            }
            sum += weight[j];
        }

        if i == k - 1 {
            break;
        }

        let mut choice = sum * rng.unit();
        let mut chosen = n - 1;
        for j in 0..n - 1 {
            choice -= weight[j];
            if choice <= 0.0 {
                chosen = j;
                break;
            }
        }
        centers.push(samples.get(chosen));
    }

    Ok((centers, lower))
}

/// Snapshot of center `i`'s coordinates, cloned out so the borrow of `centers`
/// doesn't overlap with the mutable `centers.push` later in the same pass.
fn samples_center(centers: &VectorArray, i: usize) -> Vec<f32> {
    centers.get(i).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Random;
    use crate::euclidean;

    fn sample_grid() -> VectorArray {
        let mut samples = VectorArray::new(2, 4);
        samples.push(&[0.0, 0.0]);
        samples.push(&[10.0, 0.0]);
        samples.push(&[0.0, 10.0]);
        samples.push(&[10.0, 10.0]);
        samples
    }

    #[test]
    fn seeds_requested_number_of_centers() {
        let samples = sample_grid();
        let mut rng = Random::seeded(1);
        let cancel = Cancellation::new();
        let (centers, lower) = seed_plus_plus(&samples, 3, &euclidean, &mut rng, &cancel).unwrap();
        assert_eq!(centers.len(), 3);
        assert_eq!(lower.len(), 4);
        assert!(lower.iter().all(|row| row.len() == 3));
    }

    #[test]
    fn lower_bound_is_exact_distance_at_seed_time() {
        let samples = sample_grid();
        let mut rng = Random::seeded(42);
        let cancel = Cancellation::new();
        let (centers, lower) = seed_plus_plus(&samples, 3, &euclidean, &mut rng, &cancel).unwrap();
        for j in 0..samples.len() {
            for i in 0..centers.len() {
                let exact = euclidean(samples.get(j), centers.get(i)) as f32;
                assert!((lower[j][i] - exact).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn deterministic_given_same_seed() {
        let samples = sample_grid();
        let cancel = Cancellation::new();
        let mut r1 = Random::seeded(99);
        let mut r2 = Random::seeded(99);
        let (c1, _) = seed_plus_plus(&samples, 3, &euclidean, &mut r1, &cancel).unwrap();
        let (c2, _) = seed_plus_plus(&samples, 3, &euclidean, &mut r2, &cancel).unwrap();
        for i in 0..3 {
            assert_eq!(c1.get(i), c2.get(i));
        }
    }

    #[test]
    fn cancellation_is_observed_before_seeding_completes() {
        let samples = sample_grid();
        let mut rng = Random::seeded(1);
        let cancel = Cancellation::new();
        cancel.cancel();
        let result = seed_plus_plus(&samples, 3, &euclidean, &mut rng, &cancel);
        assert!(matches!(result, Err(TrainError::Cancelled)));
    }

    #[test]
    fn all_equal_samples_selects_first_as_duplicate() {
        let mut samples = VectorArray::new(2, 3);
        samples.push(&[1.0, 1.0]);
        samples.push(&[1.0, 1.0]);
        samples.push(&[1.0, 1.0]);
        let mut rng = Random::seeded(5);
        let cancel = Cancellation::new();
        let (centers, _) = seed_plus_plus(&samples, 3, &euclidean, &mut rng, &cancel).unwrap();
        assert_eq!(centers.get(0), centers.get(1));
        assert_eq!(centers.get(1), centers.get(2));
    }
}
