//! Degenerate-case center builder, used when `numSamples <= numCenters` and
//! k-means++ seeding has no reasonable pool to draw from.
//!
//! `krukah-robopoker` has no direct analogue — its abstraction counts are
//! always far larger than `k` — so this follows the same small-free-function
//! style as `crates/rbp-clustering/src/distances.rs`: emit every distinct
//! sample as its own center, then fill whatever's left with random vectors.
use crate::RandomSource;
use crate::Vector;
use crate::VectorArray;
use crate::metric::normalize;

/// Fills `centers` (capacity `k`) from `samples` (length `<= k`): the
/// deduplicated, sorted samples first, then random unit-ish fill vectors.
///
/// `centers` must be empty on entry and have the same dimension as `samples`.
pub fn quick_centers<R>(samples: &VectorArray, centers: &mut VectorArray, norm: Option<&dyn Fn(&Vector) -> f64>, rng: &mut R)
where
    R: RandomSource,
{
    debug_assert_eq!(centers.len(), 0, "quick_centers expects an empty output array");
    let dim = samples.dim();
    let k = centers.capacity();

    let mut order: Vec<usize> = (0..samples.len()).collect();
    order.sort_by(|&a, &b| lexicographic_cmp(samples.get(a), samples.get(b)));

    for &i in &order {
        if centers.len() >= k {
            break;
        }
        let candidate = samples.get(i);
        let is_duplicate = centers.len() > 0 && centers.get(centers.len() - 1) == candidate;
        if !is_duplicate {
            centers.push(candidate);
        }
    }

    while centers.len() < k {
        let mut synthetic: Vec<f32> = (0..dim).map(|_| rng.unit() as f32).collect();
        if let Some(norm) = norm {
            normalize(&mut synthetic, norm);
        }
        centers.push(&synthetic);
    }
}

fn lexicographic_cmp(a: &Vector, b: &Vector) -> std::cmp::Ordering {
    a.iter().zip(b.iter()).map(|(x, y)| x.total_cmp(y)).find(|ord| ord.is_ne()).unwrap_or(std::cmp::Ordering::Equal)
}
