//! Vector-indexed entity store port.
//!
//! One logical table per entity kind per namespace. Records carry their
//! scalar fields as a JSON object plus the indexed `search_text` and its
//! vector. A record with empty `search_text` has no vector and participates
//! in keyword and scan paths only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::value_objects::Namespace;

/// Entity kind backing a logical table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TableKind {
    /// Work item hierarchy nodes
    WorkItems,
    /// Architecture memory items
    Architecture,
    /// Troubleshoot memory items
    Troubleshoot,
}

impl TableKind {
    /// Every table kind, in persisted-layout order.
    pub const ALL: [TableKind; 3] = [Self::WorkItems, Self::Architecture, Self::Troubleshoot];

    /// Directory name under the namespace directory.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::WorkItems => "work_items",
            Self::Architecture => "architecture",
            Self::Troubleshoot => "troubleshoot",
        }
    }
}

/// Fully-qualified table reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Owning namespace
    pub namespace: Namespace,
    /// Entity kind
    pub kind: TableKind,
}

impl TableRef {
    /// Build a table reference.
    #[must_use]
    pub fn new(namespace: Namespace, kind: TableKind) -> Self {
        Self { namespace, kind }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.kind, self.namespace)
    }
}

/// One stored record: scalar fields plus the indexed text and its vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Primary key within the table
    pub id: String,
    /// Scalar fields as a JSON object
    pub fields: serde_json::Value,
    /// Text the vector and keyword indexes cover
    #[serde(default)]
    pub search_text: String,
    /// Unit-norm embedding; `None` when `search_text` was empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

/// A record paired with its retrieval score.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    /// The matched record
    pub record: StoredRecord,
    /// Similarity, BM25, or fused score (higher is better)
    pub score: f32,
}

/// Scalar ordering for scans.
#[derive(Debug, Clone)]
pub struct OrderBy {
    /// Field name inside `fields`
    pub field: String,
    /// Sort direction
    pub descending: bool,
}

impl OrderBy {
    /// Descending order on a field.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Ascending order on a field.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }
}

/// In-process scan predicate over a record's scalar fields.
pub type RecordFilter<'a> = &'a (dyn Fn(&serde_json::Value) -> bool + Send + Sync);

/// One mutation in an atomic batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert or replace by primary key
    Put(StoredRecord),
    /// Delete by primary key (no-op when absent)
    Delete(String),
}

/// Per-namespace, per-kind record store with vector and keyword retrieval.
///
/// Writes are atomic per record; `apply` commits a whole batch atomically;
/// multi-record mutations (cascade delete, reorder, propagation) go through
/// it. Reads see a consistent snapshot within a single call.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace one record.
    async fn upsert(&self, table: &TableRef, record: StoredRecord) -> Result<()>;

    /// Point lookup.
    async fn get(&self, table: &TableRef, id: &str) -> Result<Option<StoredRecord>>;

    /// Delete by primary key. Returns whether a record was removed.
    async fn delete(&self, table: &TableRef, id: &str) -> Result<bool>;

    /// Apply a batch of writes atomically: either every op commits or none.
    async fn apply(&self, table: &TableRef, ops: Vec<WriteOp>) -> Result<()>;

    /// Scalar scan with optional predicate and ordering.
    async fn scan(
        &self,
        table: &TableRef,
        filter: Option<RecordFilter<'_>>,
        order_by: Option<OrderBy>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>>;

    /// Number of records matching the predicate.
    async fn count(&self, table: &TableRef, filter: Option<RecordFilter<'_>>) -> Result<usize>;

    /// Top-k by cosine similarity among records with vectors.
    async fn vector_topk(
        &self,
        table: &TableRef,
        query: &[f32],
        k: usize,
        filter: Option<RecordFilter<'_>>,
    ) -> Result<Vec<ScoredRecord>>;

    /// Top-k by BM25 keyword ranking over `search_text`.
    async fn keyword_topk(
        &self,
        table: &TableRef,
        query: &str,
        k: usize,
        filter: Option<RecordFilter<'_>>,
    ) -> Result<Vec<ScoredRecord>>;

    /// Reciprocal-rank fusion of vector and keyword rankings. Vector rank
    /// is skipped when `query_vector` is `None`; vector-less records keep
    /// their keyword rank.
    async fn hybrid_topk(
        &self,
        table: &TableRef,
        query_vector: Option<&[f32]>,
        query_text: &str,
        k: usize,
        filter: Option<RecordFilter<'_>>,
    ) -> Result<Vec<ScoredRecord>>;

    /// Remove every table belonging to a namespace.
    async fn drop_namespace(&self, namespace: &Namespace) -> Result<()>;
}
