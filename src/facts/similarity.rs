//! Vector similarity

use crate::error::SimilarityError;

pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity, `dot(a, b) / (|a| * |b|)`
///
/// Mismatched dimensions and zero-magnitude inputs are errors rather than NaN.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(SimilarityError::Empty);
    }

    let mut dot = 0.0f64;
    let mut a_sq = 0.0f64;
    let mut b_sq = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        a_sq += x * x;
        b_sq += y * y;
    }

    let denom = a_sq.sqrt() * b_sq.sqrt();
    if denom == 0.0 {
        return Err(SimilarityError::ZeroMagnitude);
    }

    Ok(dot / denom)
}
