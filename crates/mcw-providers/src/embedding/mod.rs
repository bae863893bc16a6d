//! Embedding providers.
//!
//! The hash provider is the deterministic default; the Ollama provider is
//! selected by configuration when a local model server is available. Both
//! produce unit-norm vectors of the configured dimension.

/// Deterministic feature-hash embedder
pub mod hash;
/// Remote embedding via an Ollama server
pub mod ollama;

pub use hash::HashEmbeddingProvider;
pub use ollama::OllamaEmbeddingProvider;
