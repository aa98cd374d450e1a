//! Post-condition validator, run once on the finished centers before `train`
//! returns successfully.
use crate::PostconditionFailure;
use crate::Vector;
use crate::VectorArray;

/// Validates `centers`: full count, no NaN/infinite coordinates, no two
/// centers byte-equal, and (if `index_norm` is supplied) no zero-norm center.
/// `centers.len()` must already equal its capacity; anything else is a fatal
/// `NotEnoughCenters`.
pub fn check_centers(centers: &VectorArray, index_norm: Option<&dyn Fn(&Vector) -> f64>) -> Result<(), PostconditionFailure> {
    if centers.len() != centers.capacity() {
        return Err(PostconditionFailure::NotEnoughCenters);
    }

    for v in centers.iter() {
        for &x in v {
            if x.is_nan() {
                return Err(PostconditionFailure::Nan);
            }
            if x.is_infinite() {
                return Err(PostconditionFailure::Infinity);
            }
        }
    }

    let mut order: Vec<usize> = (0..centers.len()).collect();
    order.sort_by(|&a, &b| lexicographic_cmp(centers.get(a), centers.get(b)));
    for pair in order.windows(2) {
        if centers.get(pair[0]) == centers.get(pair[1]) {
            return Err(PostconditionFailure::Duplicate);
        }
    }

    if let Some(norm) = index_norm {
        for v in centers.iter() {
            if norm(v) == 0.0 {
                return Err(PostconditionFailure::ZeroNorm);
            }
        }
    }

    Ok(())
}

fn lexicographic_cmp(a: &Vector, b: &Vector) -> std::cmp::Ordering {
    a.iter().zip(b.iter()).map(|(x, y)| x.total_cmp(y)).find(|ord| ord.is_ne()).unwrap_or(std::cmp::Ordering::Equal)
}
