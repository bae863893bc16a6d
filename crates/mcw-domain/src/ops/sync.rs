//! `sync_data` operation payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{WorkItemStatus, WorkItemType};

/// Conflict handling for document import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Fail records whose target already exists
    CreateOnly,
    /// Fail records whose target does not exist
    UpdateOnly,
    /// Upsert every record
    #[default]
    CreateOrUpdate,
    /// Upsert every record, then delete items absent from the import set
    Replace,
}

/// Export filters (work items only).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SyncExportFilters {
    /// Restrict to these hierarchy levels
    #[serde(default)]
    pub types: Vec<WorkItemType>,
    /// Restrict to these statuses
    #[serde(default)]
    pub statuses: Vec<WorkItemStatus>,
}

/// Arguments for `sync_data`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    /// Export work items as markdown documents
    Export {
        /// Optional scalar filters
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filters: Option<SyncExportFilters>,
    },
    /// Import markdown documents
    Import {
        /// Document contents
        documents: Vec<String>,
        /// Conflict handling
        #[serde(default)]
        mode: ImportMode,
    },
    /// Archive the namespace to a tarball
    Backup,
    /// Restore the namespace from a tarball
    Restore {
        /// Archive name as reported by `backup`
        archive: String,
    },
}

/// Arguments wrapper for `sync_data`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncDataArgs {
    /// The action with its payload
    #[serde(flatten)]
    pub action: SyncAction,
}
