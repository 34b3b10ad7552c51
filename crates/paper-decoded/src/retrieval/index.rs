//! Flat exact vector index over chunk embeddings

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Distance used to rank chunks
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Euclidean distance
    #[default]
    L2,
    /// 1 - cosine similarity
    Cosine,
}

impl DistanceMetric {
    /// Distance between two equal-length vectors
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            Self::Cosine => 1.0 - cosine_similarity(a, b),
        }
    }
}

/// Cosine similarity between two embeddings (0.0 if either is zero)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// A chunk returned from a query with its distance to the query vector
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Immutable `(vector, chunk)` collection answering exact k-NN queries.
///
/// Results are ordered by ascending distance; equal distances keep
/// insertion order.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<(Vec<f32>, Chunk)>,
    dimensions: usize,
    metric: DistanceMetric,
}

impl VectorIndex {
    /// Build the index from parallel vectors and chunks
    pub fn build(vectors: Vec<Vec<f32>>, chunks: Vec<Chunk>, metric: DistanceMetric) -> Result<Self> {
        if vectors.len() != chunks.len() {
            return Err(Error::index(format!(
                "{} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dimensions = match vectors.first() {
            Some(first) => first.len(),
            None => return Err(Error::index("cannot build an index from zero vectors")),
        };

        if dimensions == 0 {
            return Err(Error::index("vectors have zero dimensions"));
        }

        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(Error::index(format!(
                    "vector {} has {} dimensions, expected {}",
                    i,
                    vector.len(),
                    dimensions
                )));
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(Error::index(format!("vector {} has non-finite components", i)));
            }
        }

        tracing::debug!(
            "Built {:?} index with {} vectors of {} dimensions",
            metric,
            vectors.len(),
            dimensions
        );

        Ok(Self {
            entries: vectors.into_iter().zip(chunks).collect(),
            dimensions,
            metric,
        })
    }

    /// Up to `k` nearest chunks, nearest first
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if vector.len() != self.dimensions {
            return Err(Error::index(format!(
                "query has {} dimensions, index has {}",
                vector.len(),
                self.dimensions
            )));
        }

        if vector.iter().any(|x| !x.is_finite()) {
            return Err(Error::index("query vector has non-finite components"));
        }

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (v, _))| (i, self.metric.distance(vector, v)))
            .collect();

        // stable sort keeps insertion order among ties
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, distance)| SearchHit {
                chunk: self.entries[i].1.clone(),
                distance,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk(i: u32) -> Chunk {
        Chunk::new(i, 1, 0, format!("chunk {}", i))
    }

    fn index(vectors: Vec<Vec<f32>>, metric: DistanceMetric) -> VectorIndex {
        let chunks = (0..vectors.len() as u32).map(chunk).collect();
        VectorIndex::build(vectors, chunks, metric).unwrap()
    }

    #[test]
    fn test_nearest_first() {
        let idx = index(
            vec![vec![10.0, 0.0], vec![1.0, 0.0], vec![0.0, 5.0]],
            DistanceMetric::L2,
        );
        let hits = idx.query(&[0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.index, 1);
        assert_eq!(hits[1].chunk.index, 2);
        assert!((hits[0].distance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let idx = index(
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, -1.0], vec![-1.0, 0.0]],
            DistanceMetric::L2,
        );
        let hits = idx.query(&[0.0, 0.0], 4).unwrap();
        let order: Vec<_> = hits.iter().map(|h| h.chunk.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cosine_ignores_magnitude() {
        let idx = index(vec![vec![100.0, 0.0], vec![0.5, 0.5]], DistanceMetric::Cosine);
        let hits = idx.query(&[1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].chunk.index, 0);
        assert!(hits[0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_k_larger_than_index() {
        let idx = index(vec![vec![1.0], vec![2.0]], DistanceMetric::L2);
        assert_eq!(idx.len(), 2);
        assert!(!idx.is_empty());
        assert_eq!(idx.query(&[0.0], 10).unwrap().len(), 2);
        assert!(idx.query(&[0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(
            VectorIndex::build(vec![], vec![], DistanceMetric::L2),
            Err(Error::Index(_))
        ));
        assert!(VectorIndex::build(vec![vec![1.0]], vec![], DistanceMetric::L2).is_err());
        assert!(VectorIndex::build(
            vec![vec![1.0, 2.0], vec![1.0]],
            vec![chunk(0), chunk(1)],
            DistanceMetric::L2
        )
        .is_err());
        assert!(VectorIndex::build(vec![vec![f32::NAN]], vec![chunk(0)], DistanceMetric::L2).is_err());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let idx = index(vec![vec![1.0, 2.0]], DistanceMetric::L2);
        assert!(matches!(idx.query(&[1.0], 1), Err(Error::Index(_))));
    }

    proptest! {
        #[test]
        fn prop_query_bounded_and_sorted(
            vectors in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 3), 1..40),
            query in prop::collection::vec(-10.0f32..10.0, 3),
            k in 0usize..50,
            cosine in any::<bool>(),
        ) {
            let metric = if cosine { DistanceMetric::Cosine } else { DistanceMetric::L2 };
            let n = vectors.len();
            let idx = index(vectors, metric);
            let hits = idx.query(&query, k).unwrap();

            prop_assert!(hits.len() <= k);
            prop_assert_eq!(hits.len(), k.min(n));
            for pair in hits.windows(2) {
                prop_assert!(pair[0].distance <= pair[1].distance);
                if pair[0].distance == pair[1].distance {
                    prop_assert!(pair[0].chunk.index < pair[1].chunk.index);
                }
            }
        }
    }
}
