//! Built-in distance/norm adapters.
//!
//! The training core itself is polymorphic over `{distance, norm}` closures
//! (see [`crate::train`]); these free functions are the two built-in metrics
//! (Euclidean and angular/cosine) plus a matching norm, wired up by
//! [`crate::config::Metric`].
use crate::Vector;

/// L2 (Euclidean) distance. A true metric, safe for Elkan's triangle-inequality
/// pruning.
pub fn euclidean(a: &Vector, b: &Vector) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Angular distance `arccos(cos_similarity)`, clamped to `[-1, 1]` before the
/// inverse cosine to absorb floating-point overshoot. A true metric on the
/// unit sphere, suitable for spherical (cosine/inner-product) k-means.
pub fn angular(a: &Vector, b: &Vector) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let na: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let cos = (dot / (na * nb)).clamp(-1.0, 1.0);
    cos.acos()
}

/// L2 norm, for use as the optional normalization function in spherical
/// variants.
pub fn unit_norm(v: &Vector) -> f64 {
    v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt()
}

/// Normalizes `v` to unit length in place. Zero-norm vectors are left
/// unmodified rather than guessing a direction for them.
pub fn normalize(v: &mut Vector, norm: impl Fn(&Vector) -> f64) {
    let n = norm(v);
    if n > 0.0 {
        for x in v.iter_mut() {
            *x = (*x as f64 / n) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_matches_hand_computation() {
        let a = [0.0f32, 0.0];
        let b = [3.0f32, 4.0];
        assert!((euclidean(&a, &b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn euclidean_is_symmetric_and_zero_on_diagonal() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [4.0f32, -1.0, 0.5];
        assert_eq!(euclidean(&a, &a), 0.0);
        assert!((euclidean(&a, &b) - euclidean(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn angular_distance_of_orthogonal_vectors_is_quarter_turn() {
        let a = [1.0f32, 0.0];
        let b = [0.0f32, 1.0];
        assert!((angular(&a, &b) - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn angular_distance_of_identical_vectors_is_zero() {
        let a = [1.0f32, 2.0, 3.0];
        assert!(angular(&a, &a).abs() < 1e-6);
    }

    #[test]
    fn normalize_produces_unit_length_vector() {
        let mut v = [3.0f32, 4.0];
        normalize(&mut v, unit_norm);
        assert!((unit_norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_unmodified() {
        let mut v = [0.0f32, 0.0];
        normalize(&mut v, unit_norm);
        assert_eq!(v, [0.0, 0.0]);
    }
}
