//! Namespace export/import/backup/restore.
//!
//! Work items travel as markdown documents; whole namespaces travel as
//! tarball archives. Imports stage every record first, then commit one
//! atomic batch under the namespace lock and run a full bottom-up
//! recompute so derived values match what per-mutation propagation would
//! have produced.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use mcw_domain::entities::WorkItem;
use mcw_domain::error::{Error, Result};
use mcw_domain::events::DomainEvent;
use mcw_domain::ops::{
    BackupDescriptor, ExportedDocument, ImportMode, ImportReport, RecordError, SyncAction,
    SyncDataArgs, SyncExportFilters, SyncResult,
};
use mcw_domain::ports::backup::NamespaceArchiver;
use mcw_domain::ports::{
    EmbeddingProvider, EventBusProvider, SyncServiceInterface, TableKind, TableRef, VectorStore,
    WriteOp,
};
use mcw_domain::value_objects::{Namespace, WorkItemId};

use crate::locks::NamespaceLocks;
use crate::markdown;
use crate::records::{record_to_work_item, work_item_to_record};
use crate::use_cases::hierarchy;

/// Sync implementation over the vector store and the namespace archiver.
pub struct SyncServiceImpl {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    events: Arc<dyn EventBusProvider>,
    archiver: Arc<dyn NamespaceArchiver>,
    locks: Arc<NamespaceLocks>,
}

impl SyncServiceImpl {
    /// Wire the service to its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        events: Arc<dyn EventBusProvider>,
        archiver: Arc<dyn NamespaceArchiver>,
        locks: Arc<NamespaceLocks>,
    ) -> Self {
        Self {
            store,
            embedder,
            events,
            archiver,
            locks,
        }
    }

    fn table(namespace: &Namespace) -> TableRef {
        TableRef::new(namespace.clone(), TableKind::WorkItems)
    }

    async fn export(
        &self,
        namespace: &Namespace,
        filters: Option<SyncExportFilters>,
    ) -> Result<SyncResult> {
        let records = self
            .store
            .scan(&Self::table(namespace), None, None, usize::MAX)
            .await?;
        let filters = filters.unwrap_or_default();
        let mut items: Vec<WorkItem> = Vec::with_capacity(records.len());
        for record in &records {
            items.push(record_to_work_item(record)?);
        }
        // Export derived fields with fresh values.
        let map: HashMap<WorkItemId, WorkItem> =
            items.iter().map(|item| (item.id, item.clone())).collect();
        let sequences = hierarchy::sequence_numbers(&map);

        let documents = items
            .into_iter()
            .filter(|item| {
                (filters.types.is_empty() || filters.types.contains(&item.item_type))
                    && (filters.statuses.is_empty() || filters.statuses.contains(&item.status))
            })
            .map(|mut item| {
                item.sequence_number = sequences.get(&item.id).cloned();
                ExportedDocument {
                    name: format!("{}.md", item.id),
                    content: markdown::render_work_item(&item).render(),
                }
            })
            .collect();
        Ok(SyncResult::Export { documents })
    }

    async fn import(
        &self,
        namespace: &Namespace,
        documents: Vec<String>,
        mode: ImportMode,
    ) -> Result<SyncResult> {
        let table = Self::table(namespace);
        let mut report = ImportReport::default();
        let mut staged: Vec<(usize, WorkItem, Option<Vec<f32>>)> = Vec::new();

        for (index, text) in documents.iter().enumerate() {
            let outcome = async {
                let doc = markdown::Document::parse(text)?;
                let item = markdown::work_item_from_document(&doc, namespace)?;
                let vector = if item.search_text().trim().is_empty() {
                    None
                } else {
                    Some(self.embedder.embed(&item.search_text()).await?.vector)
                };
                Ok::<_, Error>((item, vector))
            }
            .await;
            match outcome {
                Ok((item, vector)) => staged.push((index, item, vector)),
                Err(error) => report.errors.push(RecordError {
                    index,
                    id: None,
                    code: error.code().to_owned(),
                    message: error.to_string(),
                }),
            }
        }

        let now = Utc::now();
        let _guard = self.locks.acquire(namespace).await;
        let existing_records = self
            .store
            .scan(&table, None, None, usize::MAX)
            .await?;
        let mut items: HashMap<WorkItemId, WorkItem> = HashMap::new();
        let mut vectors: HashMap<WorkItemId, Option<Vec<f32>>> = HashMap::new();
        for record in &existing_records {
            let item = record_to_work_item(record)?;
            vectors.insert(item.id, record.vector.clone());
            items.insert(item.id, item);
        }

        let mut imported_ids: HashSet<WorkItemId> = HashSet::new();
        for (index, item, vector) in staged {
            let exists = items.contains_key(&item.id);
            match mode {
                ImportMode::CreateOnly if exists => {
                    report.errors.push(RecordError {
                        index,
                        id: Some(item.id.as_str()),
                        code: "ErrValidation".to_owned(),
                        message: format!("work item {} already exists", item.id),
                    });
                    continue;
                }
                ImportMode::UpdateOnly if !exists => {
                    report.errors.push(RecordError {
                        index,
                        id: Some(item.id.as_str()),
                        code: "ErrNotFound".to_owned(),
                        message: format!("work item {} does not exist", item.id),
                    });
                    continue;
                }
                _ => {}
            }
            if exists {
                report.updated += 1;
            } else {
                report.created += 1;
            }
            imported_ids.insert(item.id);
            vectors.insert(item.id, vector);
            items.insert(item.id, item);
        }

        let mut deleted_ids: Vec<WorkItemId> = Vec::new();
        if mode == ImportMode::Replace {
            let absent: Vec<WorkItemId> = items
                .keys()
                .filter(|id| !imported_ids.contains(id))
                .copied()
                .collect();
            for id in absent {
                items.remove(&id);
                deleted_ids.push(id);
            }
            report.deleted = deleted_ids.len();
        }

        // Hierarchy checks against the merged state: a bad parent drops the
        // record with a per-record error rather than poisoning the batch.
        let snapshot: Vec<WorkItem> = items.values().cloned().collect();
        for item in snapshot {
            if !imported_ids.contains(&item.id) {
                continue;
            }
            let valid = match item.parent_id {
                None => true,
                Some(parent_id) => items
                    .get(&parent_id)
                    .is_some_and(|parent| parent.item_type.can_parent(item.item_type)),
            };
            if !valid {
                report.errors.push(RecordError {
                    index: 0,
                    id: Some(item.id.as_str()),
                    code: "ErrHierarchy".to_owned(),
                    message: format!("work item {} has an invalid parent", item.id),
                });
                report.created = report.created.saturating_sub(1);
                items.remove(&item.id);
                imported_ids.remove(&item.id);
            }
        }

        // Normalize: dense sibling order, derived progress/status, fresh
        // sequence caches.
        let parents: HashSet<Option<WorkItemId>> =
            items.values().map(|item| item.parent_id).collect();
        let mut changed: HashSet<WorkItemId> = imported_ids.clone();
        for parent in parents {
            changed.extend(hierarchy::densify_group(&mut items, parent, now));
        }
        changed.extend(hierarchy::recompute_all(&mut items, now));
        let sequences = hierarchy::sequence_numbers(&items);
        for (id, sequence) in &sequences {
            if let Some(item) = items.get_mut(id) {
                item.sequence_number = Some(sequence.clone());
            }
        }

        let mut ops: Vec<WriteOp> = Vec::new();
        for id in &changed {
            if let Some(item) = items.get(id) {
                let vector = vectors.get(id).cloned().flatten();
                ops.push(WriteOp::Put(work_item_to_record(item, vector)?));
            }
        }
        for id in &deleted_ids {
            ops.push(WriteOp::Delete(id.as_str()));
        }
        if !ops.is_empty() {
            self.store.apply(&table, ops).await?;
        }

        if !changed.is_empty() {
            self.events
                .publish_event(DomainEvent::WorkItemsChanged {
                    namespace: namespace.clone(),
                    changed_ids: changed.into_iter().collect(),
                    at: now,
                })
                .await?;
        }
        if !deleted_ids.is_empty() {
            self.events
                .publish_event(DomainEvent::WorkItemsDeleted {
                    namespace: namespace.clone(),
                    deleted_ids,
                    at: now,
                })
                .await?;
        }
        Ok(SyncResult::Import(report))
    }
}

#[async_trait]
impl SyncServiceInterface for SyncServiceImpl {
    async fn sync(&self, namespace: &Namespace, args: SyncDataArgs) -> Result<SyncResult> {
        match args.action {
            SyncAction::Export { filters } => self.export(namespace, filters).await,
            SyncAction::Import { documents, mode } => {
                self.import(namespace, documents, mode).await
            }
            SyncAction::Backup => {
                let descriptor = self.archiver.backup_namespace(namespace).await?;
                Ok(SyncResult::Backup(descriptor))
            }
            SyncAction::Restore { archive } => {
                let _guard = self.locks.acquire(namespace).await;
                let report = self.archiver.restore_namespace(namespace, &archive).await?;
                Ok(SyncResult::Restore(report))
            }
        }
    }

    async fn list_backups(&self) -> Result<Vec<BackupDescriptor>> {
        self.archiver.list_backups().await
    }
}
