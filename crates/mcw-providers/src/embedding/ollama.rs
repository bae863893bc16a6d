//! Remote embedding via an Ollama server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mcw_domain::error::{Error, Result};
use mcw_domain::ports::EmbeddingProvider;
use mcw_domain::value_objects::Embedding;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embedding provider backed by a local Ollama server.
///
/// The configured dimension must match what the model emits; a mismatch is
/// reported as an embedding error rather than silently truncated.
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// Build a provider against `base_url` (e.g. `http://localhost:11434`).
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
        }
    }

    fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
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
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let url = format!("{}/api/embeddings", self.base_url.trim_end_matches('/'));
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("ollama request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::embedding(format!(
                "ollama returned status {}",
                response.status()
            )));
        }
        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("ollama response malformed: {e}")))?;
        if body.embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "model '{}' emitted {} dimensions, expected {}",
                self.model,
                body.embedding.len(),
                self.dimensions
            )));
        }
        Ok(Embedding::new(
            Self::normalize(body.embedding),
            format!("ollama:{}", self.model),
        ))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
