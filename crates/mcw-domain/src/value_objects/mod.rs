//! Immutable value objects.

/// Embedding vector value object
pub mod embedding;
/// Strong-typed UUID identifiers
pub mod ids;
/// Validated tenant namespace
pub mod namespace;

pub use embedding::Embedding;
pub use ids::{ExecutionId, MemoryId, SessionId, WorkItemId};
pub use namespace::Namespace;
