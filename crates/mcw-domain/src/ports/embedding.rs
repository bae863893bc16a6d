//! Embedding provider port.

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::Embedding;

/// Maps text to a fixed-dimension unit vector.
///
/// Providers must be deterministic for a given input and safely concurrent.
/// Embedding computation is a suspension point: callers compute embeddings
/// before entering any namespace critical section.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text string.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Vector dimensionality this provider produces.
    fn dimensions(&self) -> usize;

    /// Short provider name for diagnostics.
    fn name(&self) -> &'static str;
}
