//! Provider and service port interfaces.
//!
//! Ports define contracts the domain depends on; adapters in the provider
//! and infrastructure crates implement them. Services are long-lived values
//! constructed at startup and passed by reference; there is no global
//! registry.

/// Namespace archival port
pub mod backup;
/// Embedding provider port
pub mod embedding;
/// Event bus port
pub mod event_bus;
/// Service interface ports
pub mod services;
/// Vector-indexed entity store port
pub mod store;

pub use backup::NamespaceArchiver;
pub use embedding::EmbeddingProvider;
pub use event_bus::{DomainEventStream, EventBusProvider};
pub use services::{
    MemoryServiceInterface, SearchServiceInterface, SyncServiceInterface,
    WorkItemServiceInterface,
};
pub use store::{
    OrderBy, RecordFilter, ScoredRecord, StoredRecord, TableKind, TableRef, VectorStore, WriteOp,
};
