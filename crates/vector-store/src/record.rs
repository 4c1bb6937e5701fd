use crate::error::{Result, VectorStoreError};
use docctx_units::UnitId;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Vector representation of one unit, with its L2 norm precomputed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub unit_id: UnitId,
    pub vector: Vec<f32>,
    pub norm: f32,
}

impl EmbeddingRecord {
    /// Build a record, rejecting empty vectors and non-finite components
    pub fn new(unit_id: UnitId, vector: Vec<f32>) -> Result<Self> {
        if vector.is_empty() {
            return Err(VectorStoreError::InvalidVector {
                unit: unit_id,
                reason: "empty vector".to_string(),
            });
        }
        if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
            return Err(VectorStoreError::InvalidVector {
                unit: unit_id,
                reason: format!("non-finite component at {pos}"),
            });
        }
        let norm = l2_norm(&vector);
        Ok(Self {
            unit_id,
            vector,
            norm,
        })
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    /// Cosine similarity against a query vector whose norm is already known
    #[must_use]
    pub fn similarity(&self, query: &[f32], query_norm: f32) -> f32 {
        cosine_with_norms(&self.vector, self.norm, query, query_norm)
    }
}

/// One similarity-index hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub unit_id: UnitId,
    pub score: f32,
}

#[must_use]
pub(crate) fn l2_norm(vector: &[f32]) -> f32 {
    let view = ArrayView1::from(vector);
    view.dot(&view).sqrt()
}

/// Cosine similarity of two vectors.
///
/// Zero vectors and mismatched lengths score 0, never NaN.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norms(a, l2_norm(a), b, l2_norm(b))
}

fn cosine_with_norms(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if a.len() != b.len() || norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    let dot = ArrayView1::from(a).dot(&ArrayView1::from(b));
    let score = dot / (norm_a * norm_b);
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_finite_components() {
        let err = EmbeddingRecord::new(UnitId::from("a::f"), vec![1.0, f32::NAN]).unwrap_err();
        assert!(matches!(err, VectorStoreError::InvalidVector { .. }));
        assert!(EmbeddingRecord::new(UnitId::from("a::f"), vec![]).is_err());
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_of_parallel_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_precomputed_norm_matches() {
        let record = EmbeddingRecord::new(UnitId::from("a::f"), vec![3.0, 4.0]).unwrap();
        assert!((record.norm - 5.0).abs() < 1e-6);
        assert!((record.similarity(&[3.0, 4.0], 5.0) - 1.0).abs() < 1e-6);
    }
}
