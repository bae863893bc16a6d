//! Embedding vector value object.

use serde::{Deserialize, Serialize};

/// A dense unit-norm vector produced by an embedding provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// The vector components
    pub vector: Vec<f32>,
    /// Provider that produced the vector
    pub model: String,
    /// Vector dimensionality (equals `vector.len()`)
    pub dimensions: usize,
}

impl Embedding {
    /// Build an embedding, recording its dimensionality.
    #[must_use]
    pub fn new(vector: Vec<f32>, model: impl Into<String>) -> Self {
        let dimensions = vector.len();
        Self {
            vector,
            model: model.into(),
            dimensions,
        }
    }

    /// Cosine similarity against another vector of the same dimension.
    ///
    /// Returns 0.0 when either vector has zero magnitude or lengths differ.
    #[must_use]
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;
        for (x, y) in a.iter().zip(b.iter()) {
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}
