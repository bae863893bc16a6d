//! System-wide event types for decoupled service communication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Namespace, WorkItemId};

/// Events published after mutations, consumed by the progress notifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// One mutation changed the progress, status, or position of these
    /// work items (the mutated node plus every ancestor the propagation
    /// walk touched).
    WorkItemsChanged {
        /// Namespace the mutation happened in
        namespace: Namespace,
        /// Every node whose progress, status, or position changed
        changed_ids: Vec<WorkItemId>,
        /// Mutation timestamp
        at: DateTime<Utc>,
    },
    /// Items were removed (cascade delete or replace-mode import).
    WorkItemsDeleted {
        /// Namespace the deletion happened in
        namespace: Namespace,
        /// Deleted ids
        deleted_ids: Vec<WorkItemId>,
        /// Deletion timestamp
        at: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Namespace this event belongs to.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        match self {
            Self::WorkItemsChanged { namespace, .. } | Self::WorkItemsDeleted { namespace, .. } => {
                namespace
            }
        }
    }
}
