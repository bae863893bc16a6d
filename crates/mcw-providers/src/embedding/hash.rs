//! Deterministic feature-hash embedder.
//!
//! Maps text to a unit vector by hashing word unigrams and bigrams into a
//! fixed number of slots with a hashed sign. The same input always produces
//! the same vector, on every platform, with no model downloads. This is exactly
//! the contract the rest of the system needs from an embedding provider.
//! Semantically close texts share terms, so they land in overlapping slots.

use async_trait::async_trait;

use mcw_domain::error::{Error, Result};
use mcw_domain::ports::EmbeddingProvider;
use mcw_domain::utils::tokenize;
use mcw_domain::value_objects::Embedding;

const SLOT_SEED: u64 = 0x5eed_0001;
const SIGN_SEED: u64 = 0x5eed_0002;

/// Feature-hashing embedder over word unigrams and bigrams.
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    /// Build a provider emitting vectors of the given dimension.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::config("embedding dimension must be positive"));
        }
        Ok(Self { dimensions })
    }

    fn accumulate(&self, vector: &mut [f32], term: &str, weight: f32) {
        let slot = seahash::hash_seeded(term.as_bytes(), SLOT_SEED, 0, 0, 0) as usize
            % self.dimensions;
        let sign = if seahash::hash_seeded(term.as_bytes(), SIGN_SEED, 0, 0, 0) & 1 == 0 {
            1.0
        } else {
            -1.0
        };
        vector[slot] += sign * weight;
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let terms = tokenize(text);
        for term in &terms {
            self.accumulate(&mut vector, term, 1.0);
        }
        // Bigrams carry phrase structure at half weight.
        for pair in terms.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, &bigram, 0.5);
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(Embedding::new(self.embed_sync(text), self.name()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "feature-hash"
    }
}
