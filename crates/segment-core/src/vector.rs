//! Vector arithmetic shared by the sectioner's similarity and statistics
//! calculations. All accumulators are `f64` internally, even for `f32`
//! embeddings, to limit numeric drift across long running sums.

use crate::error::{PipelineError, Result};

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> Result<f64> {
    require_same_len(a, b)?;
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum())
}

/// Euclidean (L2) norm of a vector.
pub fn norm(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt()
}

/// Unit-length copy of `v`. Returns an all-zero vector (same length) when
/// `v`'s norm is zero rather than dividing by zero.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let n = norm(v);
    if n == 0.0 {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| (f64::from(*x) / n) as f32).collect()
}

/// Cosine similarity between two equal-length vectors. Returns `0.0` when
/// either operand has zero norm (rather than `NaN`).
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f64> {
    require_same_len(a, b)?;
    let (na, nb) = (norm(a), norm(b));
    if na == 0.0 || nb == 0.0 {
        return Ok(0.0);
    }
    Ok(dot(a, b)? / (na * nb))
}

/// Cosine similarity for operands already known to be unit length — skips
/// the two norm computations `cosine` would otherwise perform.
pub fn cosine_prenormalized(a: &[f32], b: &[f32]) -> Result<f64> {
    dot(a, b)
}

/// Update a running centroid in place with the online mean formula
/// `c <- (c*n + v) / (n+1)`, where `n` is the number of vectors already
/// folded into `c`.
pub fn update_centroid_in_place(centroid: &mut [f32], v: &[f32], n: usize) -> Result<()> {
    require_same_len(centroid, v)?;
    let denom = (n + 1) as f64;
    for (c, x) in centroid.iter_mut().zip(v) {
        *c = (((f64::from(*c) * n as f64) + f64::from(*x)) / denom) as f32;
    }
    Ok(())
}

/// Arithmetic mean of a sample. `0.0` for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Standard deviation of a sample. `sample = true` applies Bessel's
/// correction (`n - 1` divisor); `sample = false` uses the population
/// divisor (`n`). `0.0` for fewer than two samples (or, for the population
/// variant, an empty slice).
pub fn std_dev(xs: &[f64], sample: bool) -> f64 {
    let n = xs.len();
    if n == 0 || (sample && n < 2) {
        return 0.0;
    }
    let m = mean(xs);
    let sum_sq: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    let divisor = if sample { (n - 1) as f64 } else { n as f64 };
    (sum_sq / divisor).sqrt()
}

/// Unwrap an optional vector argument, surfacing `NullArgument` when it is
/// absent. Used by callers that thread `Option<&[f32]>` through dynamic
/// dispatch boundaries (e.g. "centroid not yet initialized").
pub fn require<'a>(v: Option<&'a [f32]>) -> Result<&'a [f32]> {
    v.ok_or(PipelineError::NullArgument)
}

fn require_same_len(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(PipelineError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = [1.0_f32, 2.0, 3.0];
        let sim = cosine(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_opposite_vectors_is_minus_one() {
        let v = [1.0_f32, 2.0, 3.0];
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        let sim = cosine(&v, &neg).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero_not_nan() {
        let zero = [0.0_f32, 0.0, 0.0];
        let v = [1.0_f32, 2.0, 3.0];
        assert_eq!(cosine(&zero, &v).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let a = [1.0_f32, 2.0];
        let b = [1.0_f32, 2.0, 3.0];
        assert!(matches!(
            dot(&a, &b),
            Err(PipelineError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn centroid_running_mean_matches_batch_mean() {
        let mut centroid = vec![0.0_f32, 0.0];
        let samples = [[1.0_f32, 1.0], [3.0, 5.0], [5.0, 9.0]];

        centroid.copy_from_slice(&samples[0]);
        for (n, sample) in samples.iter().enumerate().skip(1) {
            update_centroid_in_place(&mut centroid, sample, n).unwrap();
        }

        assert!((centroid[0] - 3.0).abs() < 1e-5);
        assert!((centroid[1] - 5.0).abs() < 1e-5);
    }

    #[test]
    fn population_std_dev_of_constant_sample_is_zero() {
        let xs = [2.0, 2.0, 2.0];
        assert_eq!(std_dev(&xs, false), 0.0);
    }

    #[test]
    fn sample_std_dev_needs_two_points() {
        assert_eq!(std_dev(&[5.0], true), 0.0);
        assert!(std_dev(&[1.0, 2.0, 3.0], true) > 0.0);
    }

    #[test]
    fn normalize_of_zero_vector_is_zero_vector() {
        let v = [0.0_f32, 0.0, 0.0];
        assert_eq!(normalize(&v), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn require_surfaces_null_argument() {
        assert!(matches!(require(None), Err(PipelineError::NullArgument)));
        let v = [1.0_f32];
        assert!(require(Some(&v)).is_ok());
    }
}
