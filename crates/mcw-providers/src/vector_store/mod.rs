//! Vector-indexed entity store.
//!
//! One logical table per entity kind per namespace, held in memory as a
//! sorted map and snapshotted to disk as JSON under
//! `<root>/<namespace>/<table>/records.json`. Retrieval combines cosine
//! similarity over stored vectors with BM25 keyword ranking, fused by
//! reciprocal rank.

/// BM25 keyword ranking
pub mod bm25;
/// Filesystem-backed store
pub mod fs;

pub use fs::FsVectorStore;
