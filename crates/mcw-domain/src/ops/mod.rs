//! Typed request/response payloads for the tool surface.
//!
//! Every tool operation takes exactly one of these argument structs and
//! returns one of these result types. Action discriminators are serde
//! tagged enums, validated at deserialization time, so downstream code never
//! re-inspects payload shapes.

/// `memory` operation payloads
pub mod memory;
/// Result types shared across operations
pub mod results;
/// `sync_data` operation payloads
pub mod sync;
/// Work-item operation payloads
pub mod work_item;

pub use memory::{
    MemoryArgs, MemoryAction, MemoryPayload, MemoryUpdate, UseOutcome,
};
pub use results::{
    AnalyticsBlob, BackupDescriptor, BackupManifest, BlockedItem, ExecuteResult, ExportedDocument,
    GetWorkItemResult, HierarchyNode, HierarchyResult, ImportReport, ManageWorkItemResult,
    MatchCandidate, MemoryReadResult, RecordError, ReorderResult, ReorderedItem, RestoreReport,
    SearchHit, SearchResults, SmartContext, SyncResult, TrackProgressResult,
};
pub use sync::{ImportMode, SyncAction, SyncDataArgs, SyncExportFilters};
pub use work_item::{
    CreateWorkItem, DeleteWorkItem, ExecuteAction, ExecuteWorkItemArgs, GetHierarchyArgs,
    GetWorkItemArgs, HierarchyRelationship, ItemFormat, ManageWorkItemArgs, ProgressData,
    ReorderWorkItemsArgs, SearchContentArgs, SearchFilters, SearchType, TrackAction,
    TrackProgressArgs, UpdateWorkItem,
};
