//! `memory` operation payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::MemoryKind;
use crate::ops::sync::ImportMode;
use crate::value_objects::WorkItemId;

/// Arguments for the unified `memory` operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MemoryArgs {
    /// Which memory store the action targets
    pub memory_type: MemoryKind,
    /// The action with its payload
    #[serde(flatten)]
    pub action: MemoryAction,
}

/// Per-action payloads for the `memory` operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MemoryAction {
    /// Create a new memory item
    Create(MemoryPayload),
    /// Read one item by slug
    Read {
        /// Target slug
        slug: String,
    },
    /// Update an existing item
    Update(MemoryUpdate),
    /// Delete one item by slug (idempotent)
    Delete {
        /// Target slug
        slug: String,
    },
    /// List items, newest first
    List {
        /// Result cap (default 10, max 200)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
    /// Hybrid search over the store
    Search {
        /// Query text
        query: String,
        /// Result cap (default 10, max 200)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
    /// Best-match problem-to-solution selection (troubleshoot only)
    Match {
        /// Problem description
        problem: String,
        /// Result cap (default 5)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
    /// Record a consumption outcome (troubleshoot only)
    RecordUse {
        /// Target slug
        slug: String,
        /// Whether the solution worked
        outcome: UseOutcome,
    },
    /// Token-budgeted context assembly (architecture only)
    GetContext {
        /// Starting slug
        slug: String,
        /// Token budget (default 4000)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_budget: Option<usize>,
        /// BFS depth cap (default 2)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depth: Option<usize>,
    },
    /// Export items as markdown documents
    Export {
        /// Restrict to these slugs; absent exports everything
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slugs: Option<Vec<String>>,
    },
    /// Import markdown documents
    Import {
        /// Document contents
        documents: Vec<String>,
        /// Conflict handling
        #[serde(default)]
        mode: ImportMode,
    },
}

/// Outcome reported by `record_use`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UseOutcome {
    /// The solution resolved the problem
    Success,
    /// The solution did not help
    Fail,
}

/// Create payload; fields irrelevant to the target kind are rejected by
/// validation, not silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MemoryPayload {
    /// Unique-per-namespace handle, up to 100 characters
    pub slug: String,
    /// Human title
    pub title: String,
    /// Architecture: markdown requirements body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_requirements: Option<String>,
    /// Architecture: short "when to use" bullets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_when_to_use: Option<Vec<String>>,
    /// Architecture: child links (acyclic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_slugs: Option<Vec<String>>,
    /// Architecture: related links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_slugs: Option<Vec<String>>,
    /// Architecture: linked epics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_epic_ids: Option<Vec<WorkItemId>>,
    /// Troubleshoot: markdown solutions body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_solutions: Option<String>,
    /// Troubleshoot: problem descriptions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_use_case: Option<Vec<String>>,
    /// Retrieval keywords
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Free-form tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Update payload: the slug selects the item; absent fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MemoryUpdate {
    /// Target slug (immutable; selects, never renames)
    pub slug: String,
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Architecture: new requirements body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_requirements: Option<String>,
    /// Architecture: new "when to use" bullets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_when_to_use: Option<Vec<String>>,
    /// Architecture: new child links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_slugs: Option<Vec<String>>,
    /// Architecture: new related links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_slugs: Option<Vec<String>>,
    /// Architecture: new linked epics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_epic_ids: Option<Vec<WorkItemId>>,
    /// Troubleshoot: new solutions body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_solutions: Option<String>,
    /// Troubleshoot: new problem descriptions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_use_case: Option<Vec<String>>,
    /// New keywords
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// New tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
