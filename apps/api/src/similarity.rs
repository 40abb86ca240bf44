//! Cosine similarity between embedding vectors.

/// Euclidean (L2) norm of a vector.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity of `a` and `b`.
///
/// The dot product runs over the shared index range, so trailing components of
/// the longer vector are ignored. Each norm still covers its whole vector.
/// Returns exactly `0.0` when either norm is zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        tracing::debug!(
            "cosine_similarity: length mismatch ({} vs {}), truncating dot product",
            a.len(),
            b.len()
        );
    }

    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_identical_vectors_score_one() {
        let a = vec![0.3, -1.2, 4.5, 0.0, 2.2];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_is_symmetric() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-4.0, 0.5, 9.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_opposite_vectors_score_minus_one() {
        let a = vec![1.0, 2.0];
        let b = vec![-1.0, -2.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < EPS);
    }

    #[test]
    fn test_zero_vector_returns_exact_zero() {
        let zero = vec![0.0; 4];
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_empty_vectors_return_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
    }

    #[test]
    fn test_mismatched_lengths_truncate_dot_product() {
        // dot = 1*1 + 0*0 = 1; norms cover full vectors: |a| = 1, |b| = sqrt(2)
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 1.0];
        let expected = 1.0 / 2.0_f64.sqrt();
        assert!((cosine_similarity(&a, &b) - expected).abs() < EPS);
    }

    #[test]
    fn test_l2_norm() {
        assert_eq!(l2_norm(&[3.0, 4.0]), 5.0);
        assert_eq!(l2_norm(&[]), 0.0);
    }
}
