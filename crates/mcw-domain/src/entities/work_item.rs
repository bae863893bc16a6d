//! Work item hierarchy node and its derivation rules.
//!
//! The hierarchy table, leaf progress mapping, and non-leaf status
//! derivation live here as pure functions so the graph engine and its tests
//! share one source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    BLOCKED_LEAF_PROGRESS, COMPLETED_LEAF_PROGRESS, IN_PROGRESS_LEAF_PROGRESS,
    NOT_STARTED_LEAF_PROGRESS,
};
use crate::value_objects::{Namespace, WorkItemId};

/// Level of a node in the work hierarchy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkItemType {
    /// Top-level strategic container
    Initiative,
    /// Large body of work under an initiative
    Epic,
    /// Deliverable unit under an epic
    Feature,
    /// User-facing slice under an epic or feature
    Story,
    /// Smallest unit of work; always a leaf
    Task,
}

impl WorkItemType {
    /// Child types this type may parent.
    #[must_use]
    pub fn allowed_child_types(self) -> &'static [WorkItemType] {
        match self {
            Self::Initiative => &[Self::Epic, Self::Task],
            Self::Epic => &[Self::Feature, Self::Story, Self::Task],
            Self::Feature => &[Self::Story, Self::Task],
            Self::Story => &[Self::Task],
            Self::Task => &[],
        }
    }

    /// Whether `child` may be placed directly under `self`.
    #[must_use]
    pub fn can_parent(self, child: WorkItemType) -> bool {
        self.allowed_child_types().contains(&child)
    }
}

/// Lifecycle status of a work item.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkItemStatus {
    /// No work has begun
    NotStarted,
    /// Work underway
    InProgress,
    /// Work cannot proceed
    Blocked,
    /// Work finished
    Completed,
    /// Work abandoned; excluded from parent averaging
    Cancelled,
}

impl WorkItemStatus {
    /// Progress a leaf with this status contributes to parent averaging.
    #[must_use]
    pub fn leaf_progress(self) -> f64 {
        match self {
            Self::NotStarted | Self::Cancelled => NOT_STARTED_LEAF_PROGRESS,
            Self::InProgress => IN_PROGRESS_LEAF_PROGRESS,
            Self::Blocked => BLOCKED_LEAF_PROGRESS,
            Self::Completed => COMPLETED_LEAF_PROGRESS,
        }
    }
}

/// Priority of a work item.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    /// Nice to have
    Low,
    /// Normal
    Medium,
    /// Important
    High,
    /// Drop everything
    Critical,
}

/// Estimated complexity of a work item.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Complexity {
    /// Well understood, low risk
    Simple,
    /// Some unknowns
    Moderate,
    /// Significant unknowns or cross-cutting impact
    Complex,
}

/// One node in the work hierarchy.
///
/// `sequence_number` and (for non-leaves) `progress` and `status` are
/// derived; stored copies are caches refreshed on mutation and recomputed
/// on read when they disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Globally unique identifier, assigned on create
    pub id: WorkItemId,
    /// Owning tenant; immutable
    pub namespace: Namespace,
    /// Hierarchy level; immutable after create
    #[serde(rename = "type")]
    pub item_type: WorkItemType,
    /// 1-200 characters
    pub title: String,
    /// Markdown, up to 10 000 characters
    #[serde(default)]
    pub description: String,
    /// Lifecycle status (derived for non-leaves)
    pub status: WorkItemStatus,
    /// Priority
    pub priority: Priority,
    /// Estimated complexity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    /// Parent node; `None` for roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<WorkItemId>,
    /// Dense 0-based position among siblings
    pub order_index: usize,
    /// Cached dotted-path label; derived truth wins on disagreement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
    /// Progress in [0,1]; derived for non-leaves
    pub progress: f64,
    /// Ordered list of short acceptance criteria
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// Free-form tags
    #[serde(default)]
    pub context_tags: Vec<String>,
    /// Free markdown notes
    #[serde(default)]
    pub notes: String,
    /// Set when an operator manually cancelled a non-leaf; suppresses
    /// status derivation for this node
    #[serde(default)]
    pub status_override: bool,
    /// Creation timestamp (UTC)
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp (UTC)
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    /// Text indexed for semantic and keyword retrieval.
    #[must_use]
    pub fn search_text(&self) -> String {
        if self.description.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.description)
        }
    }
}

/// Derive a non-leaf status from its included children's statuses.
///
/// Evaluated top to bottom, matching the derivation table:
/// all completed-or-cancelled with at least one completed wins, then
/// all-cancelled, then all-not-started (none cancelled), then any-blocked,
/// otherwise in progress. `statuses` must be non-empty.
#[must_use]
pub fn derive_parent_status(statuses: &[WorkItemStatus]) -> WorkItemStatus {
    use WorkItemStatus as S;

    let all_cancelled = statuses.iter().all(|s| *s == S::Cancelled);
    if all_cancelled {
        return S::Cancelled;
    }
    let any_completed = statuses.iter().any(|s| *s == S::Completed);
    let all_terminal = statuses
        .iter()
        .all(|s| matches!(s, S::Completed | S::Cancelled));
    if all_terminal && any_completed {
        return S::Completed;
    }
    if statuses.iter().all(|s| *s == S::NotStarted) {
        return S::NotStarted;
    }
    if statuses.iter().any(|s| *s == S::Blocked) {
        return S::Blocked;
    }
    S::InProgress
}

/// Mean progress over children, excluding cancelled ones.
///
/// `children` pairs each child's status with its stored progress. Returns
/// 0.0 when every child is cancelled (or the slice is empty).
#[must_use]
pub fn derive_parent_progress(children: &[(WorkItemStatus, f64)]) -> f64 {
    let included: Vec<f64> = children
        .iter()
        .filter(|(status, _)| *status != WorkItemStatus::Cancelled)
        .map(|(_, progress)| *progress)
        .collect();
    if included.is_empty() {
        return 0.0;
    }
    included.iter().sum::<f64>() / included.len() as f64
}
