//! Service interface ports.
//!
//! The tool dispatcher depends on these traits, not on concrete services,
//! so transports and tests can swap implementations.

use std::time::Instant;

use async_trait::async_trait;

use crate::entities::MemoryKind;
use crate::error::Result;
use crate::ops::{
    ExecuteResult, ExecuteWorkItemArgs, ExportedDocument, GetHierarchyArgs, GetWorkItemArgs,
    GetWorkItemResult, HierarchyResult, ImportMode, ImportReport, ManageWorkItemArgs,
    ManageWorkItemResult, MatchCandidate, MemoryPayload, MemoryReadResult, MemoryUpdate,
    ReorderResult, ReorderWorkItemsArgs, SearchContentArgs, SearchResults, SmartContext,
    SyncDataArgs, SyncResult, TrackProgressArgs, TrackProgressResult, UseOutcome,
};
use crate::value_objects::Namespace;

/// Work-item graph engine operations.
#[async_trait]
pub trait WorkItemServiceInterface: Send + Sync {
    /// Create, update, or delete one work item.
    async fn manage(
        &self,
        namespace: &Namespace,
        args: ManageWorkItemArgs,
    ) -> Result<ManageWorkItemResult>;

    /// Resolve and fetch one work item.
    async fn get(&self, namespace: &Namespace, args: GetWorkItemArgs) -> Result<GetWorkItemResult>;

    /// Traverse the hierarchy around an item.
    async fn hierarchy(
        &self,
        namespace: &Namespace,
        args: GetHierarchyArgs,
    ) -> Result<HierarchyResult>;

    /// Rewrite a sibling group's ordering.
    async fn reorder(
        &self,
        namespace: &Namespace,
        args: ReorderWorkItemsArgs,
    ) -> Result<ReorderResult>;

    /// Record progress or compute namespace analytics.
    async fn track(
        &self,
        namespace: &Namespace,
        args: TrackProgressArgs,
    ) -> Result<TrackProgressResult>;

    /// Advisory execution tracking.
    async fn execute(
        &self,
        namespace: &Namespace,
        args: ExecuteWorkItemArgs,
    ) -> Result<ExecuteResult>;
}

/// Work-item retrieval.
#[async_trait]
pub trait SearchServiceInterface: Send + Sync {
    /// Semantic, keyword, or hybrid search over work items.
    async fn search(&self, namespace: &Namespace, args: SearchContentArgs) -> Result<SearchResults>;
}

/// Architecture and troubleshoot memory operations.
#[async_trait]
pub trait MemoryServiceInterface: Send + Sync {
    /// Create a memory item.
    async fn create(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        payload: MemoryPayload,
    ) -> Result<MemoryReadResult>;

    /// Read one item by slug, flagging dangling links.
    async fn read(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        slug: &str,
    ) -> Result<MemoryReadResult>;

    /// Update an existing item.
    async fn update(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        update: MemoryUpdate,
    ) -> Result<MemoryReadResult>;

    /// Delete by slug. Returns whether anything was removed.
    async fn delete(&self, namespace: &Namespace, kind: MemoryKind, slug: &str) -> Result<bool>;

    /// List items, newest first.
    async fn list(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        limit: usize,
    ) -> Result<Vec<serde_json::Value>>;

    /// Hybrid search over one memory store.
    async fn search(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<serde_json::Value>>;

    /// Best-match problem-to-solution selection (troubleshoot).
    async fn match_problem(
        &self,
        namespace: &Namespace,
        problem: &str,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>>;

    /// Record a consumption outcome (troubleshoot).
    async fn record_use(
        &self,
        namespace: &Namespace,
        slug: &str,
        outcome: UseOutcome,
    ) -> Result<MemoryReadResult>;

    /// Token-budgeted context assembly (architecture).
    ///
    /// When `deadline` is set, assembly stops there and returns whatever
    /// was gathered with `truncated = true` rather than failing the call.
    async fn get_context(
        &self,
        namespace: &Namespace,
        slug: &str,
        token_budget: usize,
        depth: usize,
        deadline: Option<Instant>,
    ) -> Result<SmartContext>;

    /// Export items as markdown documents.
    async fn export(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        slugs: Option<Vec<String>>,
    ) -> Result<Vec<ExportedDocument>>;

    /// Import markdown documents.
    async fn import(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        documents: Vec<String>,
        mode: ImportMode,
    ) -> Result<ImportReport>;
}

/// Export/import/backup/restore for whole namespaces.
#[async_trait]
pub trait SyncServiceInterface: Send + Sync {
    /// Dispatch one `sync_data` action.
    async fn sync(&self, namespace: &Namespace, args: SyncDataArgs) -> Result<SyncResult>;

    /// Enumerate backup archives with their manifests.
    async fn list_backups(&self) -> Result<Vec<crate::ops::BackupDescriptor>>;
}
