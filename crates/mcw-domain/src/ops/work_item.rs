//! Work-item operation payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Complexity, ExecutionMode, Priority, WorkItemStatus, WorkItemType};
use crate::value_objects::WorkItemId;

fn default_true() -> bool {
    true
}

/// Deserializes a present field into `Some(..)` so that an explicit `null`
/// (`Some(None)`) stays distinguishable from an absent field (`None`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Payload shaping for item-returning operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemFormat {
    /// id, type, title, status
    Minimal,
    /// Minimal plus progress, priority, sequence number, child count
    #[default]
    Summary,
    /// The full record
    Detailed,
}

/// Arguments for `manage_work_item`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageWorkItemArgs {
    /// Create a new work item
    Create(CreateWorkItem),
    /// Update an existing work item
    Update(UpdateWorkItem),
    /// Delete a work item (idempotent on absent ids)
    Delete(DeleteWorkItem),
}

/// Fields for creating a work item.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateWorkItem {
    /// Hierarchy level
    #[serde(rename = "type")]
    pub item_type: WorkItemType,
    /// Title, 1-200 characters
    pub title: String,
    /// Markdown description, up to 10 000 characters
    #[serde(default)]
    pub description: String,
    /// Initial status; defaults to `not_started`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkItemStatus>,
    /// Priority; defaults to `medium`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Estimated complexity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    /// Parent node; must permit this item's type as a child
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<WorkItemId>,
    /// Ordered acceptance criteria, up to 20
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// Free-form tags
    #[serde(default)]
    pub context_tags: Vec<String>,
    /// Free markdown notes
    #[serde(default)]
    pub notes: String,
}

/// Fields for updating a work item. Absent fields are left untouched;
/// `parent_id: null` explicitly detaches the item to the root level.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateWorkItem {
    /// Target item
    pub work_item_id: WorkItemId,
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New status (leaves only, except manual `cancelled`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkItemStatus>,
    /// New priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New complexity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    /// New parent: absent = unchanged, `null` = detach to root
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<Option<WorkItemId>>,
    /// Replacement acceptance criteria
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<Vec<String>>,
    /// Replacement tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_tags: Option<Vec<String>>,
    /// Replacement notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Fields for deleting a work item.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteWorkItem {
    /// Target item
    pub work_item_id: WorkItemId,
    /// Delete the whole subtree (default); `false` reparents children to
    /// the root level instead
    #[serde(default = "default_true")]
    pub delete_children: bool,
}

/// Arguments for `get_work_item`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetWorkItemArgs {
    /// Exact item id (UUID string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_item_id: Option<String>,
    /// Free-text fallback: exact title, then prefix, then keyword search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug_or_keyword: Option<String>,
    /// Include direct children in the result
    #[serde(default)]
    pub include_children: bool,
    /// Payload shaping
    #[serde(default)]
    pub format: ItemFormat,
}

/// Retrieval flavor for `search_content`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// Vector similarity only
    Semantic,
    /// BM25 keyword ranking only
    Keyword,
    /// Rank fusion of both; an empty query means "list"
    #[default]
    Hybrid,
}

/// Scalar filters applied before ranking.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchFilters {
    /// Restrict to one hierarchy level
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<WorkItemType>,
    /// Restrict to one status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkItemStatus>,
    /// Restrict to one priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Restrict to direct children of this parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<WorkItemId>,
    /// Require all of these tags
    #[serde(default)]
    pub context_tags: Vec<String>,
}

/// Arguments for `search_content`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchContentArgs {
    /// Query text; empty is legal and means "list" under hybrid
    #[serde(default)]
    pub query: String,
    /// Retrieval flavor
    #[serde(default)]
    pub search_type: SearchType,
    /// Scalar filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
    /// Result cap (default 10, max 200)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Payload shaping
    #[serde(default)]
    pub format: ItemFormat,
}

/// Which related nodes `get_hierarchy` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyRelationship {
    /// Direct children only
    #[default]
    Children,
    /// The whole subtree
    Descendants,
    /// Parent chain up to the root
    Ancestors,
    /// The full tree containing the item (or the whole forest without one)
    FullHierarchy,
    /// Items this item depends on (parent chain plus preceding siblings)
    Dependencies,
}

/// Arguments for `get_hierarchy`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetHierarchyArgs {
    /// Anchor item; optional for `full_hierarchy`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_item_id: Option<WorkItemId>,
    /// Traversal flavor
    #[serde(default)]
    pub relationship: HierarchyRelationship,
    /// Depth cap, at least 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Keep completed nodes in the result
    #[serde(default = "default_true")]
    pub include_completed: bool,
    /// Keep cancelled nodes in the result
    #[serde(default)]
    pub include_cancelled: bool,
}

/// Advisory action for `execute_work_item`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteAction {
    /// Record an execution request
    #[default]
    Execute,
    /// Report the current record
    Status,
    /// Cancel the record
    Cancel,
}

/// Arguments for `execute_work_item`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteWorkItemArgs {
    /// Target item
    pub work_item_id: WorkItemId,
    /// Advisory action
    #[serde(default)]
    pub action: ExecuteAction,
    /// Requested ordering, recorded only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExecutionMode>,
}

/// Action for `track_progress`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrackAction {
    /// Record progress on one item
    #[default]
    Track,
    /// Summarize the namespace
    GetAnalytics,
}

/// Progress payload for `track_progress(action=track)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProgressData {
    /// Percent complete, 0-100; with an explicit status this overrides the
    /// leaf derivation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    /// New status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkItemStatus>,
    /// Progress notes, appended to the item's notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Current blockers, recorded in the item's notes
    #[serde(default)]
    pub blockers: Vec<String>,
}

/// Arguments for `track_progress`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrackProgressArgs {
    /// Track one item or summarize the namespace
    #[serde(default)]
    pub action: TrackAction,
    /// Target item (required for `track`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_item_id: Option<WorkItemId>,
    /// Progress payload (required for `track`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_data: Option<ProgressData>,
}

/// Arguments for `reorder_work_items`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReorderWorkItemsArgs {
    /// Sibling group to reorder; `None` targets the root level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<WorkItemId>,
    /// The complete sibling set in its new order
    pub work_item_ids: Vec<WorkItemId>,
}
