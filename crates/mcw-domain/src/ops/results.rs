//! Result types for the tool surface.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ExecutionRecord, WorkItem, WorkItemStatus};
use crate::value_objects::{Namespace, WorkItemId};

/// Result of `manage_work_item`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManageWorkItemResult {
    /// The created or updated item (sequence number refreshed)
    Item(Box<WorkItem>),
    /// Delete outcome; empty when the target was already absent
    Deleted {
        /// Every removed id (the target plus cascaded descendants)
        deleted_ids: Vec<WorkItemId>,
    },
}

/// Result of `get_work_item`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetWorkItemResult {
    /// The resolved item, shaped by the requested format
    pub item: serde_json::Value,
    /// Direct children when `include_children` was set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<serde_json::Value>,
}

/// One ranked search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched item, shaped by the requested format
    pub item: serde_json::Value,
    /// Fused or single-source relevance score
    pub score: f32,
}

/// Result of `search_content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Ranked hits, best first
    pub results: Vec<SearchHit>,
    /// Matches before the limit was applied
    pub total_found: usize,
}

/// One node in a hierarchy result tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// The node itself (sequence number refreshed)
    #[serde(flatten)]
    pub item: WorkItem,
    /// Nested children (empty for flat relationships)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

/// Result of `get_hierarchy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyResult {
    /// Trees (children/descendants/full) or ordered flat lists
    /// (ancestors/dependencies)
    pub nodes: Vec<HierarchyNode>,
}

/// One repositioned sibling after a reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderedItem {
    /// The sibling
    pub id: WorkItemId,
    /// Its new dense position
    pub order_index: usize,
    /// Its new derived sequence number
    pub sequence_number: String,
}

/// Result of `reorder_work_items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderResult {
    /// The reordered sibling group's parent (`None` for the root level)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<WorkItemId>,
    /// The new order
    pub items: Vec<ReorderedItem>,
}

/// Result of `track_progress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackProgressResult {
    /// The updated item after propagation
    Item(Box<WorkItem>),
    /// Namespace analytics
    Analytics(Box<AnalyticsBlob>),
}

/// A blocked item surfaced in analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedItem {
    /// The item
    pub id: WorkItemId,
    /// Its title
    pub title: String,
    /// Notes text (carries recorded blockers)
    pub notes: String,
}

/// Namespace analytics blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsBlob {
    /// Total items in the namespace
    pub total: usize,
    /// Count per status
    pub by_status: BTreeMap<String, usize>,
    /// Count per hierarchy level
    pub by_type: BTreeMap<String, usize>,
    /// Count per priority
    pub by_priority: BTreeMap<String, usize>,
    /// Completed leaves over non-cancelled leaves
    pub completion_rate: f64,
    /// Items currently blocked
    pub blocked: Vec<BlockedItem>,
    /// Most recently updated item ids, newest first
    pub recently_updated: Vec<WorkItemId>,
}

/// Result of `execute_work_item`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResult {
    /// The advisory record
    pub record: ExecutionRecord,
    /// Status of the target at response time
    pub item_status: WorkItemStatus,
}

/// A memory item read, with link diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryReadResult {
    /// The item
    pub item: serde_json::Value,
    /// Child or related slugs that do not resolve in this namespace
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dangling: Vec<String>,
}

/// One candidate from the troubleshoot matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Candidate slug
    pub slug: String,
    /// Candidate title
    pub title: String,
    /// Solutions body
    pub ai_solutions: String,
    /// Combined rank score
    pub score: f64,
    /// Raw vector/keyword similarity component
    pub similarity: f64,
    /// Historical success rate
    pub success_rate: f64,
}

/// Result of `memory(action=get_context)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartContext {
    /// Assembled context text
    pub context: String,
    /// Every slug visited during assembly
    pub visited_slugs: Vec<String>,
    /// True when the token budget or deadline cut assembly short
    pub truncated: bool,
}

/// One exported document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedDocument {
    /// Stable document name (slug or id plus `.md`)
    pub name: String,
    /// Full document content
    pub content: String,
}

/// Per-record import failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordError {
    /// Position in the submitted document list
    pub index: usize,
    /// Target id or slug when one could be parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Error taxonomy code
    pub code: String,
    /// Human message
    pub message: String,
}

/// Result of an import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    /// Records created
    pub created: usize,
    /// Records updated
    pub updated: usize,
    /// Records deleted by `replace` mode
    pub deleted: usize,
    /// Per-record failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RecordError>,
}

/// Backup archive manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupManifest {
    /// On-disk layout version
    pub schema_version: u32,
    /// Archived namespace
    pub namespace: Namespace,
    /// Item counts per table
    pub counts: BTreeMap<String, usize>,
    /// Archive timestamp (UTC)
    pub created_at: DateTime<Utc>,
}

/// Result of `sync_data(action=backup)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDescriptor {
    /// Archive file name under the backup directory
    pub archive: String,
    /// Manifest embedded in the archive
    pub manifest: BackupManifest,
}

/// Result of `sync_data(action=restore)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Restored namespace
    pub namespace: Namespace,
    /// Item counts per table after restore
    pub counts: BTreeMap<String, usize>,
}

/// Result of `sync_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncResult {
    /// Export outcome
    Export {
        /// The exported documents
        documents: Vec<ExportedDocument>,
    },
    /// Import outcome
    Import(ImportReport),
    /// Backup outcome
    Backup(BackupDescriptor),
    /// Restore outcome
    Restore(RestoreReport),
}
