//! # Provider Adapters
//!
//! Concrete implementations of the domain's provider ports: embedding
//! generation and the vector-indexed entity store. Providers are plain
//! values constructed at startup by the infrastructure layer.

/// Embedding providers
pub mod embedding;
/// Vector-indexed entity store
pub mod vector_store;

pub use embedding::{HashEmbeddingProvider, OllamaEmbeddingProvider};
pub use vector_store::FsVectorStore;
