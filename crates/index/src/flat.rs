//! Flat inner-product vector index.
//!
//! An exhaustive scan over L2-normalized vectors. With normalized inputs
//! the inner product equals cosine similarity, so the highest-scoring
//! rows are the semantically closest documents. The corpus is seed-sized,
//! so every query scans every vector.
//!
//! The struct serializes with `bincode` — this is the opaque binary
//! artifact the [`crate::SemanticIndex`] persists next to its metadata
//! file.

use serde::{Deserialize, Serialize};
use shopclerk_core::IndexError;

/// A fixed-dimension set of vectors searchable by inner product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Build an index from a non-empty set of equal-dimension vectors.
    ///
    /// Vector ordinal position is the index's document ordinal — callers
    /// keep metadata in the same order.
    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dim = match vectors.first() {
            Some(v) => v.len(),
            None => return Err(IndexError::EmptyCorpus),
        };

        for v in &vectors {
            if v.len() != dim {
                return Err(IndexError::DimensionMismatch {
                    expected: dim,
                    actual: v.len(),
                });
            }
        }

        Ok(Self { dim, vectors })
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Top-`k` rows by inner product against `query`, highest first.
    ///
    /// Returns `(ordinal, score)` pairs; ties keep insertion order.
    /// Fewer than `k` results when the index holds fewer vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(query, v)))
            .collect();

        // Stable sort: equal scores keep ascending ordinal order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Inner product of two equal-length vectors.
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Normalize `v` to unit L2 length in place.
///
/// A zero vector is left untouched — there is no direction to preserve.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm > 1e-12 {
        for x in v.iter_mut() {
            *x = (*x as f64 / norm) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(v: Vec<f32>) -> Vec<f32> {
        let mut v = v;
        l2_normalize(&mut v);
        v
    }

    #[test]
    fn from_vectors_rejects_empty() {
        assert!(matches!(
            FlatIndex::from_vectors(vec![]),
            Err(IndexError::EmptyCorpus)
        ));
    }

    #[test]
    fn from_vectors_rejects_ragged_dimensions() {
        let err = FlatIndex::from_vectors(vec![vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn search_ranks_by_inner_product() {
        let index = FlatIndex::from_vectors(vec![
            unit(vec![0.0, 1.0]), // orthogonal to query
            unit(vec![1.0, 0.0]), // identical to query
            unit(vec![1.0, 1.0]), // ~0.707
        ])
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let ordinals: Vec<_> = hits.iter().map(|(i, _)| *i).collect();
        assert_eq!(ordinals, [1, 2, 0]);
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn search_returns_at_most_k() {
        let index =
            FlatIndex::from_vectors(vec![unit(vec![1.0, 0.0]), unit(vec![0.0, 1.0])]).unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 1).unwrap().len(), 1);
        // Fewer than k when the index is smaller.
        assert_eq!(index.search(&[1.0, 0.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn search_ties_keep_insertion_order() {
        let v = unit(vec![1.0, 0.0]);
        let index = FlatIndex::from_vectors(vec![v.clone(), v.clone(), v]).unwrap();
        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let ordinals: Vec<_> = hits.iter().map(|(i, _)| *i).collect();
        assert_eq!(ordinals, [0, 1, 2]);
    }

    #[test]
    fn search_rejects_wrong_query_dimension() {
        let index = FlatIndex::from_vectors(vec![unit(vec![1.0, 0.0])]).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(IndexError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn normalize_produces_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn bincode_roundtrip() {
        let index =
            FlatIndex::from_vectors(vec![unit(vec![1.0, 2.0]), unit(vec![3.0, 4.0])]).unwrap();
        let bytes = bincode::serialize(&index).unwrap();
        let back: FlatIndex = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.dim(), 2);
        let a = index.search(&[1.0, 0.0], 2).unwrap();
        let b = back.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(a, b);
    }
}
