//! Work-item graph engine.
//!
//! All mutations for one namespace run under that namespace's lock:
//! embeddings are computed before the lock is taken, then the critical
//! section loads the namespace, applies the mutation and the propagation
//! walk in memory, commits one atomic batch to the store, and publishes a
//! single event.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use mcw_domain::constants::{ACCEPTANCE_CRITERIA_MAX, MARKDOWN_MAX_CHARS, TITLE_MAX_CHARS};
use mcw_domain::entities::{
    ExecutionMode, ExecutionRecord, ExecutionState, WorkItem, WorkItemStatus,
};
use mcw_domain::error::{Error, Result};
use mcw_domain::events::DomainEvent;
use mcw_domain::ops::{
    AnalyticsBlob, BlockedItem, CreateWorkItem, DeleteWorkItem, ExecuteAction, ExecuteResult,
    ExecuteWorkItemArgs, GetHierarchyArgs, GetWorkItemArgs, GetWorkItemResult, HierarchyNode,
    HierarchyRelationship, HierarchyResult, ItemFormat, ManageWorkItemArgs, ManageWorkItemResult,
    ReorderResult, ReorderWorkItemsArgs, ReorderedItem, TrackAction, TrackProgressArgs,
    TrackProgressResult, UpdateWorkItem,
};
use mcw_domain::ports::{
    EmbeddingProvider, EventBusProvider, TableKind, TableRef, VectorStore,
    WorkItemServiceInterface, WriteOp,
};
use mcw_domain::value_objects::{ExecutionId, Namespace, WorkItemId};

use crate::constants::ANALYTICS_RECENT_ITEMS;
use crate::format::shape_item;
use crate::locks::NamespaceLocks;
use crate::records::{record_to_work_item, work_item_to_record};
use crate::use_cases::hierarchy;

/// Graph engine implementation over the vector store.
pub struct WorkItemServiceImpl {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    events: Arc<dyn EventBusProvider>,
    locks: Arc<NamespaceLocks>,
    executions: DashMap<WorkItemId, ExecutionRecord>,
}

type LoadedNamespace = (
    HashMap<WorkItemId, WorkItem>,
    HashMap<WorkItemId, Option<Vec<f32>>>,
);

impl WorkItemServiceImpl {
    /// Wire the engine to its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        events: Arc<dyn EventBusProvider>,
        locks: Arc<NamespaceLocks>,
    ) -> Self {
        Self {
            store,
            embedder,
            events,
            locks,
            executions: DashMap::new(),
        }
    }

    fn table(namespace: &Namespace) -> TableRef {
        TableRef::new(namespace.clone(), TableKind::WorkItems)
    }

    /// Load every item in the namespace plus its stored vector.
    async fn load_namespace(&self, namespace: &Namespace) -> Result<LoadedNamespace> {
        let records = self
            .store
            .scan(&Self::table(namespace), None, None, usize::MAX)
            .await?;
        let mut items = HashMap::with_capacity(records.len());
        let mut vectors = HashMap::with_capacity(records.len());
        for record in &records {
            let item = record_to_work_item(record)?;
            vectors.insert(item.id, record.vector.clone());
            items.insert(item.id, item);
        }
        Ok((items, vectors))
    }

    /// Commit written and deleted items as one atomic batch, then publish.
    async fn commit(
        &self,
        namespace: &Namespace,
        items: &HashMap<WorkItemId, WorkItem>,
        vectors: &HashMap<WorkItemId, Option<Vec<f32>>>,
        written: &[WorkItemId],
        deleted: &[WorkItemId],
    ) -> Result<()> {
        let mut ops = Vec::with_capacity(written.len() + deleted.len());
        let mut seen = HashSet::new();
        for id in written {
            if !seen.insert(*id) {
                continue;
            }
            let item = items
                .get(id)
                .ok_or_else(|| Error::internal(format!("written item {id} missing from state")))?;
            let vector = vectors.get(id).cloned().flatten();
            ops.push(WriteOp::Put(work_item_to_record(item, vector)?));
        }
        for id in deleted {
            ops.push(WriteOp::Delete(id.as_str()));
        }
        if ops.is_empty() {
            return Ok(());
        }
        self.store.apply(&Self::table(namespace), ops).await?;

        let now = Utc::now();
        if !written.is_empty() {
            let changed_ids: Vec<WorkItemId> = {
                let mut seen = HashSet::new();
                written
                    .iter()
                    .copied()
                    .filter(|id| seen.insert(*id))
                    .collect()
            };
            self.events
                .publish_event(DomainEvent::WorkItemsChanged {
                    namespace: namespace.clone(),
                    changed_ids,
                    at: now,
                })
                .await?;
        }
        if !deleted.is_empty() {
            self.events
                .publish_event(DomainEvent::WorkItemsDeleted {
                    namespace: namespace.clone(),
                    deleted_ids: deleted.to_vec(),
                    at: now,
                })
                .await?;
        }
        Ok(())
    }

    fn refresh_sequences(items: &mut HashMap<WorkItemId, WorkItem>) {
        let sequences = hierarchy::sequence_numbers(items);
        for (id, sequence) in sequences {
            if let Some(item) = items.get_mut(&id) {
                item.sequence_number = Some(sequence);
            }
        }
    }

    fn validate_text_fields(
        title: Option<&str>,
        description: Option<&str>,
        acceptance_criteria: Option<&[String]>,
    ) -> Result<()> {
        if let Some(title) = title {
            if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
                return Err(Error::validation(format!(
                    "title must be 1-{TITLE_MAX_CHARS} characters"
                )));
            }
        }
        if let Some(description) = description {
            if description.chars().count() > MARKDOWN_MAX_CHARS {
                return Err(Error::validation(format!(
                    "description exceeds {MARKDOWN_MAX_CHARS} characters"
                )));
            }
        }
        if let Some(criteria) = acceptance_criteria {
            if criteria.len() > ACCEPTANCE_CRITERIA_MAX {
                return Err(Error::validation(format!(
                    "at most {ACCEPTANCE_CRITERIA_MAX} acceptance criteria allowed"
                )));
            }
        }
        Ok(())
    }

    fn check_parent_edge(
        items: &HashMap<WorkItemId, WorkItem>,
        child_type: mcw_domain::entities::WorkItemType,
        parent_id: WorkItemId,
    ) -> Result<()> {
        let parent = items
            .get(&parent_id)
            .ok_or_else(|| Error::not_found(format!("parent work item {parent_id}")))?;
        if !parent.item_type.can_parent(child_type) {
            return Err(Error::hierarchy(format!(
                "{} cannot contain {}",
                parent.item_type, child_type
            )));
        }
        Ok(())
    }

}

// Create / update / delete
impl WorkItemServiceImpl {
    async fn create(
        &self,
        namespace: &Namespace,
        args: CreateWorkItem,
    ) -> Result<ManageWorkItemResult> {
        Self::validate_text_fields(
            Some(&args.title),
            Some(&args.description),
            Some(&args.acceptance_criteria),
        )?;

        let now = Utc::now();
        let status = args.status.unwrap_or(WorkItemStatus::NotStarted);
        let mut item = WorkItem {
            id: WorkItemId::new(),
            namespace: namespace.clone(),
            item_type: args.item_type,
            title: args.title,
            description: args.description,
            status,
            priority: args.priority.unwrap_or(mcw_domain::entities::Priority::Medium),
            complexity: args.complexity,
            parent_id: args.parent_id,
            order_index: 0,
            sequence_number: None,
            progress: status.leaf_progress(),
            acceptance_criteria: args.acceptance_criteria,
            context_tags: args.context_tags,
            notes: args.notes,
            status_override: false,
            created_at: now,
            updated_at: now,
        };

        // Suspension point: embed before entering the critical section.
        let vector = Some(self.embedder.embed(&item.search_text()).await?.vector);

        let _guard = self.locks.acquire(namespace).await;
        let (mut items, mut vectors) = self.load_namespace(namespace).await?;

        if let Some(parent_id) = item.parent_id {
            Self::check_parent_edge(&items, item.item_type, parent_id)?;
        }
        item.order_index = items
            .values()
            .filter(|sibling| sibling.parent_id == item.parent_id)
            .count();

        let id = item.id;
        let parent_id = item.parent_id;
        vectors.insert(id, vector);
        items.insert(id, item);

        let mut written = vec![id];
        written.extend(hierarchy::propagate_from(&mut items, parent_id, now));
        Self::refresh_sequences(&mut items);

        self.commit(namespace, &items, &vectors, &written, &[]).await?;
        Ok(ManageWorkItemResult::Item(Box::new(items[&id].clone())))
    }

    #[allow(clippy::too_many_lines)]
    async fn update(
        &self,
        namespace: &Namespace,
        args: UpdateWorkItem,
    ) -> Result<ManageWorkItemResult> {
        Self::validate_text_fields(
            args.title.as_deref(),
            args.description.as_deref(),
            args.acceptance_criteria.as_deref(),
        )?;

        // Embed outside the lock when the indexed text will change.
        let new_vector = if args.title.is_some() || args.description.is_some() {
            let record = self
                .store
                .get(&Self::table(namespace), &args.work_item_id.as_str())
                .await?
                .ok_or_else(|| Error::not_found(format!("work item {}", args.work_item_id)))?;
            let current = record_to_work_item(&record)?;
            let title = args.title.clone().unwrap_or(current.title);
            let description = args.description.clone().unwrap_or(current.description);
            let text = if description.is_empty() {
                title
            } else {
                format!("{title} {description}")
            };
            Some(self.embedder.embed(&text).await?.vector)
        } else {
            None
        };

        let now = Utc::now();
        let _guard = self.locks.acquire(namespace).await;
        let (mut items, mut vectors) = self.load_namespace(namespace).await?;
        let id = args.work_item_id;
        if !items.contains_key(&id) {
            return Err(Error::not_found(format!("work item {id}")));
        }

        let has_children = items.values().any(|item| item.parent_id == Some(id));
        let old_parent = items[&id].parent_id;
        let mut written: Vec<WorkItemId> = vec![id];

        // Status first: non-leaf statuses are derived, with the single
        // exception of an operator cancelling a whole subtree.
        if let Some(status) = args.status {
            let item = items.get_mut(&id).ok_or_else(|| Error::internal("item vanished"))?;
            if has_children {
                if status == WorkItemStatus::Cancelled {
                    item.status = WorkItemStatus::Cancelled;
                    item.status_override = true;
                } else {
                    return Err(Error::derived(format!(
                        "status of non-leaf {id} is derived from its children"
                    )));
                }
            } else {
                item.status = status;
                item.progress = status.leaf_progress();
            }
        }

        {
            let item = items.get_mut(&id).ok_or_else(|| Error::internal("item vanished"))?;
            if let Some(title) = args.title {
                item.title = title;
            }
            if let Some(description) = args.description {
                item.description = description;
            }
            if let Some(priority) = args.priority {
                item.priority = priority;
            }
            if let Some(complexity) = args.complexity {
                item.complexity = Some(complexity);
            }
            if let Some(criteria) = args.acceptance_criteria {
                item.acceptance_criteria = criteria;
            }
            if let Some(tags) = args.context_tags {
                item.context_tags = tags;
            }
            if let Some(notes) = args.notes {
                item.notes = notes;
            }
            item.updated_at = now;
        }
        if let Some(vector) = new_vector {
            vectors.insert(id, Some(vector));
        }

        // Reparenting last: it needs the final type/status in place.
        if let Some(new_parent) = args.parent_id {
            if new_parent != old_parent {
                if let Some(parent_id) = new_parent {
                    if hierarchy::would_cycle(&items, id, parent_id) {
                        return Err(Error::cycle(format!(
                            "moving {id} under {parent_id} would create a cycle"
                        )));
                    }
                    Self::check_parent_edge(&items, items[&id].item_type, parent_id)?;
                }
                let new_index = items
                    .values()
                    .filter(|item| item.parent_id == new_parent && item.id != id)
                    .count();
                {
                    let item =
                        items.get_mut(&id).ok_or_else(|| Error::internal("item vanished"))?;
                    item.parent_id = new_parent;
                    item.order_index = new_index;
                }
                written.extend(hierarchy::densify_group(&mut items, old_parent, now));
                written.extend(hierarchy::propagate_from(&mut items, old_parent, now));
                written.extend(hierarchy::propagate_from(&mut items, new_parent, now));
            }
        }

        let final_parent = items[&id].parent_id;
        written.extend(hierarchy::propagate_from(&mut items, final_parent, now));
        Self::refresh_sequences(&mut items);

        self.commit(namespace, &items, &vectors, &written, &[]).await?;
        Ok(ManageWorkItemResult::Item(Box::new(items[&id].clone())))
    }

    async fn delete(
        &self,
        namespace: &Namespace,
        args: DeleteWorkItem,
    ) -> Result<ManageWorkItemResult> {
        let now = Utc::now();
        let _guard = self.locks.acquire(namespace).await;
        let (mut items, vectors) = self.load_namespace(namespace).await?;
        let id = args.work_item_id;

        // Idempotent: deleting an absent id succeeds with an empty set.
        if !items.contains_key(&id) {
            return Ok(ManageWorkItemResult::Deleted { deleted_ids: vec![] });
        }
        let old_parent = items[&id].parent_id;

        let deleted_ids = if args.delete_children {
            hierarchy::subtree_ids(&items, id)
        } else {
            vec![id]
        };

        let mut written: Vec<WorkItemId> = Vec::new();
        if !args.delete_children {
            // Orphans keep their relative order, appended after the roots.
            let mut orphans: Vec<WorkItemId> = items
                .values()
                .filter(|item| item.parent_id == Some(id))
                .map(|item| item.id)
                .collect();
            orphans.sort_by_key(|orphan| items[orphan].order_index);
            let root_count = items
                .values()
                .filter(|item| item.parent_id.is_none() && item.id != id)
                .count();
            for (offset, orphan) in orphans.iter().enumerate() {
                let item = items
                    .get_mut(orphan)
                    .ok_or_else(|| Error::internal("orphan vanished"))?;
                item.parent_id = None;
                item.order_index = root_count + offset;
                item.updated_at = now;
                written.push(*orphan);
            }
        }
        for deleted in &deleted_ids {
            items.remove(deleted);
        }

        written.extend(hierarchy::densify_group(&mut items, old_parent, now));
        written.extend(hierarchy::densify_group(&mut items, None, now));
        written.extend(hierarchy::propagate_from(&mut items, old_parent, now));
        Self::refresh_sequences(&mut items);

        self.commit(namespace, &items, &vectors, &written, &deleted_ids)
            .await?;
        Ok(ManageWorkItemResult::Deleted { deleted_ids })
    }
}

// Resolver and reads
impl WorkItemServiceImpl {
    /// Resolve a reference: UUID, then exact title, then title prefix, then
    /// keyword search. Ties break toward the most recently updated item.
    async fn resolve(
        &self,
        namespace: &Namespace,
        items: &HashMap<WorkItemId, WorkItem>,
        reference: &str,
    ) -> Result<WorkItemId> {
        if let Ok(uuid) = reference.parse::<uuid::Uuid>() {
            let id = WorkItemId::from_uuid(uuid);
            return if items.contains_key(&id) {
                Ok(id)
            } else {
                Err(Error::not_found(format!("work item {reference}")))
            };
        }

        let newest = |candidates: Vec<&WorkItem>| -> Option<WorkItemId> {
            candidates
                .into_iter()
                .max_by_key(|item| item.updated_at)
                .map(|item| item.id)
        };

        let exact: Vec<&WorkItem> = items
            .values()
            .filter(|item| item.title == reference)
            .collect();
        if let Some(id) = newest(exact) {
            return Ok(id);
        }

        let prefix: Vec<&WorkItem> = items
            .values()
            .filter(|item| item.title.starts_with(reference))
            .collect();
        if let Some(id) = newest(prefix) {
            return Ok(id);
        }

        let query = self.embedder.embed(reference).await?.vector;
        let hits = self
            .store
            .hybrid_topk(&Self::table(namespace), Some(&query), reference, 1, None)
            .await?;
        hits.first()
            .and_then(|hit| hit.record.id.parse::<uuid::Uuid>().ok())
            .map(WorkItemId::from_uuid)
            .ok_or_else(|| Error::not_found(format!("work item matching '{reference}'")))
    }

    fn child_counts(items: &HashMap<WorkItemId, WorkItem>) -> HashMap<WorkItemId, usize> {
        let mut counts: HashMap<WorkItemId, usize> = HashMap::new();
        for item in items.values() {
            if let Some(parent) = item.parent_id {
                *counts.entry(parent).or_default() += 1;
            }
        }
        counts
    }

    fn shaped(
        items: &HashMap<WorkItemId, WorkItem>,
        sequences: &HashMap<WorkItemId, String>,
        id: WorkItemId,
        format: ItemFormat,
        counts: &HashMap<WorkItemId, usize>,
    ) -> serde_json::Value {
        let mut item = items[&id].clone();
        item.sequence_number = sequences.get(&id).cloned();
        shape_item(&item, format, counts.get(&id).copied().unwrap_or(0))
    }

    fn build_tree(
        items: &HashMap<WorkItemId, WorkItem>,
        sequences: &HashMap<WorkItemId, String>,
        index: &HashMap<Option<WorkItemId>, Vec<WorkItemId>>,
        id: WorkItemId,
        depth_left: usize,
        include_completed: bool,
        include_cancelled: bool,
    ) -> Option<HierarchyNode> {
        let item = items.get(&id)?;
        if (!include_completed && item.status == WorkItemStatus::Completed)
            || (!include_cancelled && item.status == WorkItemStatus::Cancelled)
        {
            return None;
        }
        let mut node_item = item.clone();
        node_item.sequence_number = sequences.get(&id).cloned();
        let children = if depth_left > 0 {
            index
                .get(&Some(id))
                .into_iter()
                .flatten()
                .filter_map(|child| {
                    Self::build_tree(
                        items,
                        sequences,
                        index,
                        *child,
                        depth_left - 1,
                        include_completed,
                        include_cancelled,
                    )
                })
                .collect()
        } else {
            Vec::new()
        };
        Some(HierarchyNode {
            item: node_item,
            children,
        })
    }

    fn flat_node(
        items: &HashMap<WorkItemId, WorkItem>,
        sequences: &HashMap<WorkItemId, String>,
        id: WorkItemId,
    ) -> HierarchyNode {
        let mut item = items[&id].clone();
        item.sequence_number = sequences.get(&id).cloned();
        HierarchyNode {
            item,
            children: Vec::new(),
        }
    }
}

// Track progress and analytics
impl WorkItemServiceImpl {
    async fn track_item(
        &self,
        namespace: &Namespace,
        args: TrackProgressArgs,
    ) -> Result<TrackProgressResult> {
        let id = args
            .work_item_id
            .ok_or_else(|| Error::validation("track requires work_item_id"))?;
        let data = args
            .progress_data
            .ok_or_else(|| Error::validation("track requires progress_data"))?;
        if let Some(percent) = data.percent {
            if !(0.0..=100.0).contains(&percent) {
                return Err(Error::validation("percent must be within 0-100"));
            }
        }

        let now = Utc::now();
        let _guard = self.locks.acquire(namespace).await;
        let (mut items, vectors) = self.load_namespace(namespace).await?;
        if !items.contains_key(&id) {
            return Err(Error::not_found(format!("work item {id}")));
        }
        let has_children = items.values().any(|item| item.parent_id == Some(id));

        {
            let item = items.get_mut(&id).ok_or_else(|| Error::internal("item vanished"))?;
            if let Some(status) = data.status {
                if has_children {
                    if status == WorkItemStatus::Cancelled {
                        item.status = WorkItemStatus::Cancelled;
                        item.status_override = true;
                    } else {
                        return Err(Error::derived(format!(
                            "status of non-leaf {id} is derived from its children"
                        )));
                    }
                } else {
                    item.status = status;
                    item.progress = status.leaf_progress();
                }
            }
            if let Some(percent) = data.percent {
                if has_children {
                    return Err(Error::derived(format!(
                        "progress of non-leaf {id} is derived from its children"
                    )));
                }
                // An explicit percent wins over the status-derived value.
                item.progress = percent / 100.0;
            }
            if let Some(notes) = data.notes {
                if item.notes.is_empty() {
                    item.notes = notes;
                } else {
                    item.notes = format!("{}\n{notes}", item.notes);
                }
            }
            if !data.blockers.is_empty() {
                let blockers = format!("Blockers: {}", data.blockers.join(", "));
                if item.notes.is_empty() {
                    item.notes = blockers;
                } else {
                    item.notes = format!("{}\n{blockers}", item.notes);
                }
            }
            item.updated_at = now;
        }

        let parent = items[&id].parent_id;
        let mut written = vec![id];
        written.extend(hierarchy::propagate_from(&mut items, parent, now));
        Self::refresh_sequences(&mut items);

        self.commit(namespace, &items, &vectors, &written, &[]).await?;
        Ok(TrackProgressResult::Item(Box::new(items[&id].clone())))
    }

    async fn analytics(&self, namespace: &Namespace) -> Result<TrackProgressResult> {
        let (items, _) = self.load_namespace(namespace).await?;
        let index = hierarchy::children_index(&items);

        let mut by_status = std::collections::BTreeMap::new();
        let mut by_type = std::collections::BTreeMap::new();
        let mut by_priority = std::collections::BTreeMap::new();
        for item in items.values() {
            *by_status.entry(item.status.to_string()).or_default() += 1;
            *by_type.entry(item.item_type.to_string()).or_default() += 1;
            *by_priority.entry(item.priority.to_string()).or_default() += 1;
        }

        let leaves: Vec<&WorkItem> = items
            .values()
            .filter(|item| index.get(&Some(item.id)).is_none_or(Vec::is_empty))
            .collect();
        let active_leaves = leaves
            .iter()
            .filter(|item| item.status != WorkItemStatus::Cancelled)
            .count();
        let completed_leaves = leaves
            .iter()
            .filter(|item| item.status == WorkItemStatus::Completed)
            .count();
        let completion_rate = if active_leaves == 0 {
            0.0
        } else {
            completed_leaves as f64 / active_leaves as f64
        };

        let blocked = items
            .values()
            .filter(|item| item.status == WorkItemStatus::Blocked)
            .map(|item| BlockedItem {
                id: item.id,
                title: item.title.clone(),
                notes: item.notes.clone(),
            })
            .collect();

        let mut recent: Vec<&WorkItem> = items.values().collect();
        recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let recently_updated = recent
            .iter()
            .take(ANALYTICS_RECENT_ITEMS)
            .map(|item| item.id)
            .collect();

        Ok(TrackProgressResult::Analytics(Box::new(AnalyticsBlob {
            total: items.len(),
            by_status,
            by_type,
            by_priority,
            completion_rate,
            blocked,
            recently_updated,
        })))
    }
}

#[async_trait]
impl WorkItemServiceInterface for WorkItemServiceImpl {
    async fn manage(
        &self,
        namespace: &Namespace,
        args: ManageWorkItemArgs,
    ) -> Result<ManageWorkItemResult> {
        match args {
            ManageWorkItemArgs::Create(create) => self.create(namespace, create).await,
            ManageWorkItemArgs::Update(update) => self.update(namespace, update).await,
            ManageWorkItemArgs::Delete(delete) => self.delete(namespace, delete).await,
        }
    }

    async fn get(&self, namespace: &Namespace, args: GetWorkItemArgs) -> Result<GetWorkItemResult> {
        let reference = args
            .work_item_id
            .as_deref()
            .or(args.slug_or_keyword.as_deref())
            .ok_or_else(|| Error::validation("work_item_id or slug_or_keyword is required"))?;

        let (items, _) = self.load_namespace(namespace).await?;
        let id = self.resolve(namespace, &items, reference).await?;
        let sequences = hierarchy::sequence_numbers(&items);
        let counts = Self::child_counts(&items);

        let children = if args.include_children {
            let index = hierarchy::children_index(&items);
            index
                .get(&Some(id))
                .into_iter()
                .flatten()
                .map(|child| Self::shaped(&items, &sequences, *child, args.format, &counts))
                .collect()
        } else {
            Vec::new()
        };

        Ok(GetWorkItemResult {
            item: Self::shaped(&items, &sequences, id, args.format, &counts),
            children,
        })
    }

    async fn hierarchy(
        &self,
        namespace: &Namespace,
        args: GetHierarchyArgs,
    ) -> Result<HierarchyResult> {
        if args.max_depth == Some(0) {
            return Err(Error::validation("max_depth must be at least 1"));
        }
        let depth = args.max_depth.unwrap_or(usize::MAX);
        let (items, _) = self.load_namespace(namespace).await?;
        let sequences = hierarchy::sequence_numbers(&items);
        let index = hierarchy::children_index(&items);

        let anchor = match args.work_item_id {
            Some(id) => {
                if !items.contains_key(&id) {
                    return Err(Error::not_found(format!("work item {id}")));
                }
                Some(id)
            }
            None => None,
        };

        let nodes = match args.relationship {
            HierarchyRelationship::Children => {
                let id =
                    anchor.ok_or_else(|| Error::validation("children requires work_item_id"))?;
                index
                    .get(&Some(id))
                    .into_iter()
                    .flatten()
                    .filter_map(|child| {
                        Self::build_tree(
                            &items,
                            &sequences,
                            &index,
                            *child,
                            0,
                            args.include_completed,
                            args.include_cancelled,
                        )
                    })
                    .collect()
            }
            HierarchyRelationship::Descendants => {
                let id = anchor
                    .ok_or_else(|| Error::validation("descendants requires work_item_id"))?;
                index
                    .get(&Some(id))
                    .into_iter()
                    .flatten()
                    .filter_map(|child| {
                        Self::build_tree(
                            &items,
                            &sequences,
                            &index,
                            *child,
                            depth.saturating_sub(1),
                            args.include_completed,
                            args.include_cancelled,
                        )
                    })
                    .collect()
            }
            HierarchyRelationship::Ancestors => {
                let id =
                    anchor.ok_or_else(|| Error::validation("ancestors requires work_item_id"))?;
                hierarchy::ancestors(&items, id)
                    .into_iter()
                    .take(depth)
                    .map(|ancestor| Self::flat_node(&items, &sequences, ancestor))
                    .collect()
            }
            HierarchyRelationship::FullHierarchy => {
                let roots: Vec<WorkItemId> = match anchor {
                    Some(id) => {
                        let chain = hierarchy::ancestors(&items, id);
                        vec![chain.last().copied().unwrap_or(id)]
                    }
                    None => index.get(&None).cloned().unwrap_or_default(),
                };
                roots
                    .into_iter()
                    .filter_map(|root| {
                        Self::build_tree(
                            &items,
                            &sequences,
                            &index,
                            root,
                            depth.saturating_sub(1),
                            args.include_completed,
                            args.include_cancelled,
                        )
                    })
                    .collect()
            }
            HierarchyRelationship::Dependencies => {
                let id = anchor
                    .ok_or_else(|| Error::validation("dependencies requires work_item_id"))?;
                // Parent chain plus earlier siblings: what must land before
                // this item can sensibly start.
                let mut nodes: Vec<HierarchyNode> = hierarchy::ancestors(&items, id)
                    .into_iter()
                    .map(|ancestor| Self::flat_node(&items, &sequences, ancestor))
                    .collect();
                let anchor_item = &items[&id];
                let mut earlier: Vec<&WorkItem> = items
                    .values()
                    .filter(|item| {
                        item.parent_id == anchor_item.parent_id
                            && item.order_index < anchor_item.order_index
                    })
                    .collect();
                earlier.sort_by_key(|item| item.order_index);
                nodes.extend(
                    earlier
                        .into_iter()
                        .map(|item| Self::flat_node(&items, &sequences, item.id)),
                );
                nodes
            }
        };

        Ok(HierarchyResult { nodes })
    }

    async fn reorder(
        &self,
        namespace: &Namespace,
        args: ReorderWorkItemsArgs,
    ) -> Result<ReorderResult> {
        let now = Utc::now();
        let _guard = self.locks.acquire(namespace).await;
        let (mut items, vectors) = self.load_namespace(namespace).await?;

        let current: HashSet<WorkItemId> = items
            .values()
            .filter(|item| item.parent_id == args.parent_id)
            .map(|item| item.id)
            .collect();
        let proposed: HashSet<WorkItemId> = args.work_item_ids.iter().copied().collect();
        if proposed.len() != args.work_item_ids.len() || proposed != current {
            return Err(Error::order_set(format!(
                "reorder set does not match the {} current siblings",
                current.len()
            )));
        }

        let mut written = Vec::new();
        for (position, id) in args.work_item_ids.iter().enumerate() {
            let item = items
                .get_mut(id)
                .filter(|item| item.order_index != position);
            if let Some(item) = item {
                item.order_index = position;
                item.updated_at = now;
                written.push(*id);
            }
        }
        Self::refresh_sequences(&mut items);
        self.commit(namespace, &items, &vectors, &written, &[]).await?;

        let sequences = hierarchy::sequence_numbers(&items);
        let result_items = args
            .work_item_ids
            .iter()
            .enumerate()
            .map(|(position, id)| ReorderedItem {
                id: *id,
                order_index: position,
                sequence_number: sequences.get(id).cloned().unwrap_or_default(),
            })
            .collect();
        Ok(ReorderResult {
            parent_id: args.parent_id,
            items: result_items,
        })
    }

    async fn track(
        &self,
        namespace: &Namespace,
        args: TrackProgressArgs,
    ) -> Result<TrackProgressResult> {
        match args.action {
            TrackAction::Track => self.track_item(namespace, args).await,
            TrackAction::GetAnalytics => self.analytics(namespace).await,
        }
    }

    async fn execute(
        &self,
        namespace: &Namespace,
        args: ExecuteWorkItemArgs,
    ) -> Result<ExecuteResult> {
        let record = self
            .store
            .get(&Self::table(namespace), &args.work_item_id.as_str())
            .await?
            .ok_or_else(|| Error::not_found(format!("work item {}", args.work_item_id)))?;
        let item = record_to_work_item(&record)?;
        let now = Utc::now();

        let record = match args.action {
            ExecuteAction::Execute => {
                let record = ExecutionRecord {
                    id: ExecutionId::new(),
                    work_item_id: args.work_item_id,
                    mode: args.mode.unwrap_or(ExecutionMode::Sequential),
                    state: ExecutionState::Running,
                    started_at: now,
                    updated_at: now,
                };
                self.executions.insert(args.work_item_id, record.clone());
                record
            }
            ExecuteAction::Status => self
                .executions
                .get(&args.work_item_id)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| {
                    Error::not_found(format!("execution record for {}", args.work_item_id))
                })?,
            ExecuteAction::Cancel => {
                let mut entry = self.executions.get_mut(&args.work_item_id).ok_or_else(|| {
                    Error::not_found(format!("execution record for {}", args.work_item_id))
                })?;
                entry.state = ExecutionState::Cancelled;
                entry.updated_at = now;
                entry.value().clone()
            }
        };

        Ok(ExecuteResult {
            record,
            item_status: item.status,
        })
    }
}
