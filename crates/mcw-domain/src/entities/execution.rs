//! Advisory execution records.
//!
//! `execute_work_item` tracks intent and status only; nothing is ever run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ExecutionId, WorkItemId};

/// Requested execution ordering (recorded, not acted on).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionMode {
    /// One child at a time
    Sequential,
    /// All children at once
    Parallel,
    /// Dependency order
    Dependency,
}

/// Lifecycle of an advisory execution record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionState {
    /// Execution was requested
    Running,
    /// Execution was cancelled by the client
    Cancelled,
}

/// Advisory status-tracking record for one work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Record identifier
    pub id: ExecutionId,
    /// Target work item
    pub work_item_id: WorkItemId,
    /// Requested mode
    pub mode: ExecutionMode,
    /// Current state
    pub state: ExecutionState,
    /// Request timestamp (UTC)
    pub started_at: DateTime<Utc>,
    /// Last state change (UTC)
    pub updated_at: DateTime<Utc>,
}
