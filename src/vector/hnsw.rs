// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HNSW index for the local vector store
//!
//! Approximate nearest neighbour search over cosine distance. The index is
//! rebuilt from the persisted embeddings whenever the collection changes.

use hnsw_rs::hnsw::{Hnsw, Neighbour};
use hnsw_rs::prelude::*;

use super::VectorStoreError;

/// Upper bound on HNSW layers supported by hnsw_rs
const MAX_LAYERS: usize = 16;

/// Search result: position of the vector in the build input and its
/// cosine distance to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

pub struct HnswIndex {
    /// `None` when built from an empty collection
    hnsw: Option<Hnsw<'static, f32, DistCosine>>,
    len: usize,
    dimensions: usize,
}

impl HnswIndex {
    /// Build an index over the given vectors. Positions in `vectors` are
    /// the ids returned by [`HnswIndex::search`].
    ///
    /// # Errors
    ///
    /// Returns error if a vector has the wrong dimensions or contains NaN
    /// or Infinity values.
    pub fn build(vectors: &[&[f32]], dimensions: usize) -> Result<Self, VectorStoreError> {
        for vector in vectors {
            if vector.len() != dimensions {
                return Err(VectorStoreError::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(VectorStoreError::Index(
                    "vector contains NaN or Infinity values".to_string(),
                ));
            }
        }

        if vectors.is_empty() {
            return Ok(Self {
                hnsw: None,
                len: 0,
                dimensions,
            });
        }

        let max_nb_connection = 16;
        let ef_construction = 200;
        // log2(n), clamped to what hnsw_rs supports
        let nb_layer = ((vectors.len() as f32).log2().ceil() as usize).clamp(4, MAX_LAYERS);

        let mut hnsw: Hnsw<f32, DistCosine> = Hnsw::new(
            max_nb_connection,
            vectors.len(),
            nb_layer,
            ef_construction,
            DistCosine,
        );

        for (position, vector) in vectors.iter().enumerate() {
            let normalized = normalize_vector(vector);
            hnsw.insert((normalized.as_slice(), position));
        }
        hnsw.set_searching_mode(true);

        Ok(Self {
            hnsw: Some(hnsw),
            len: vectors.len(),
            dimensions,
        })
    }

    /// Find the `k` nearest vectors, closest first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorStoreError> {
        if query.len() != self.dimensions {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(VectorStoreError::Index(
                "query contains NaN or Infinity values".to_string(),
            ));
        }

        let Some(hnsw) = &self.hnsw else {
            return Ok(vec![]);
        };
        if k == 0 {
            return Ok(vec![]);
        }

        let normalized = normalize_vector(query);
        let ef_search = (k * 2).max(50);
        let neighbours: Vec<Neighbour> = hnsw.search(&normalized, k.min(self.len), ef_search);

        let mut results: Vec<Neighbor> = neighbours
            .into_iter()
            .map(|n| Neighbor {
                position: n.d_id,
                distance: n.distance,
            })
            .collect();
        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Divide a vector by its L2 norm. Zero vectors are returned unchanged.
fn normalize_vector(vector: &[f32]) -> Vec<f32> {
    let magnitude: f32 = vector.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return vector.to_vec();
    }
    vector.iter().map(|&x| x / magnitude).collect()
}
