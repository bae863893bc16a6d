//! Architecture and troubleshoot memory items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MemoryId, Namespace, WorkItemId};

/// Kind discriminator for the unified `memory` tool operation.
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
pub enum MemoryKind {
    /// Reusable design/context item addressable by slug
    Architecture,
    /// Reusable problem/solution entry with usage statistics
    Troubleshoot,
}

/// Reusable architecture knowledge addressable by slug.
///
/// `children_slugs` forms a DAG (cycles rejected on write); `related_slugs`
/// is a symmetric tag-like relation and may contain cycles. Either kind of
/// link may reference a slug that does not exist yet; dangling links are
/// flagged on read, not rejected on write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureItem {
    /// Globally unique identifier
    pub id: MemoryId,
    /// Owning tenant; immutable
    pub namespace: Namespace,
    /// Unique-per-namespace handle; immutable
    pub slug: String,
    /// Human title
    pub title: String,
    /// Markdown requirements body, up to 10 000 characters
    #[serde(default)]
    pub ai_requirements: String,
    /// Short "when to use" bullets, up to 10
    #[serde(default)]
    pub ai_when_to_use: Vec<String>,
    /// Retrieval keywords, up to 20
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Child links (acyclic), up to 50
    #[serde(default)]
    pub children_slugs: Vec<String>,
    /// Related links (symmetric, cycles allowed), up to 20
    #[serde(default)]
    pub related_slugs: Vec<String>,
    /// Linked epics, up to 20
    #[serde(default)]
    pub linked_epic_ids: Vec<WorkItemId>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp (UTC)
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp (UTC)
    pub updated_at: DateTime<Utc>,
}

impl ArchitectureItem {
    /// Text indexed for semantic and keyword retrieval.
    #[must_use]
    pub fn search_text(&self) -> String {
        let mut parts = vec![self.title.clone()];
        if !self.ai_requirements.is_empty() {
            parts.push(self.ai_requirements.clone());
        }
        if !self.keywords.is_empty() {
            parts.push(self.keywords.join(" "));
        }
        parts.join(" ")
    }
}

/// Reusable problem/solution entry with usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroubleshootItem {
    /// Globally unique identifier
    pub id: MemoryId,
    /// Owning tenant; immutable
    pub namespace: Namespace,
    /// Unique-per-namespace handle; immutable
    pub slug: String,
    /// Human title
    pub title: String,
    /// Markdown solutions body, up to 10 000 characters
    #[serde(default)]
    pub ai_solutions: String,
    /// Problem descriptions this entry addresses, up to 10
    #[serde(default)]
    pub ai_use_case: Vec<String>,
    /// Retrieval keywords, up to 20
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Times this entry was consumed by a client
    #[serde(default)]
    pub usage_count: u64,
    /// Times consumption was reported successful; never exceeds `usage_count`
    #[serde(default)]
    pub success_count: u64,
    /// Creation timestamp (UTC)
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp (UTC)
    pub updated_at: DateTime<Utc>,
}

impl TroubleshootItem {
    /// `success_count / max(usage_count, 1)`
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        self.success_count as f64 / self.usage_count.max(1) as f64
    }

    /// Text indexed for semantic and keyword retrieval: use cases first,
    /// then solutions, so problem phrasing dominates the vector.
    #[must_use]
    pub fn search_text(&self) -> String {
        let mut parts = vec![self.title.clone()];
        parts.extend(self.ai_use_case.iter().cloned());
        if !self.ai_solutions.is_empty() {
            parts.push(self.ai_solutions.clone());
        }
        parts.join(" ")
    }
}
