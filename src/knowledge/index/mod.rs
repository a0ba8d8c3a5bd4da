
use serde::{Deserialize, Serialize};

use crate::{GatewayError, Result};

/// Inner-product similarity index over L2-normalized vectors.
///
/// Derived entirely from the document store and rebuilt from scratch on
/// every change; never a source of truth. All rows share one dimensionality,
/// and a query of any other dimensionality is an error the caller treats as
/// a fallback trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    rows: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Build an index from raw (unnormalized) vectors.
    #[inline]
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let Some(first) = vectors.first() else {
            return Ok(Self {
                dimension: 0,
                rows: Vec::new(),
            });
        };

        let dimension = first.len();
        if dimension == 0 {
            return Err(GatewayError::Index(
                "cannot index zero-dimensional vectors".to_string(),
            ));
        }

        let mut rows = Vec::with_capacity(vectors.len());
        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(GatewayError::Index(format!(
                    "dimensionality mismatch at row {}: expected {}, got {}",
                    position,
                    dimension,
                    vector.len()
                )));
            }
            rows.push(normalize(vector));
        }

        Ok(Self { dimension, rows })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cosine similarity of `query` against every row; the `top_k` best
    /// matches at or above `min_score`, as `(row, score)` pairs.
    ///
    /// Ties preserve row order.
    #[inline]
    pub fn search(&self, query: &[f32], top_k: usize, min_score: f32) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(GatewayError::Index(format!(
                "query dimensionality {} does not match index dimensionality {}",
                query.len(),
                self.dimension
            )));
        }

        let query = normalize(query);

        let mut scored: Vec<(usize, f32)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(row, vector)| (row, dot(&query, vector)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        scored.retain(|(_, score)| *score >= min_score);

        Ok(scored)
    }
}

fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter().map(|x| x / norm).collect()
    } else {
        vector.to_vec()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
