//! Core business entities with identity.

/// Advisory execution records
pub mod execution;
/// Architecture and troubleshoot memory items
pub mod memory;
/// Transport session
pub mod session;
/// Work item hierarchy node
pub mod work_item;

pub use execution::{ExecutionMode, ExecutionRecord, ExecutionState};
pub use memory::{ArchitectureItem, MemoryKind, TroubleshootItem};
pub use session::{ClientInfo, Session};
pub use work_item::{
    derive_parent_progress, derive_parent_status, Complexity, Priority, WorkItem, WorkItemStatus,
    WorkItemType,
};
