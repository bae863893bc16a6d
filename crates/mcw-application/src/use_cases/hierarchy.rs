//! Pure hierarchy computations shared by the graph engine and its tests.
//!
//! Everything here operates on an in-memory map of a namespace's items.
//! Nothing suspends and nothing touches storage, so the engine can run
//! these inside its critical section.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use mcw_domain::constants::PROGRESS_EPSILON;
use mcw_domain::entities::{derive_parent_progress, derive_parent_status, WorkItem, WorkItemStatus};
use mcw_domain::value_objects::WorkItemId;

/// Index of sibling groups: parent (or `None` for roots) to ordered child
/// ids, sorted by `order_index`.
#[must_use]
pub fn children_index(
    items: &HashMap<WorkItemId, WorkItem>,
) -> HashMap<Option<WorkItemId>, Vec<WorkItemId>> {
    let mut index: HashMap<Option<WorkItemId>, Vec<WorkItemId>> = HashMap::new();
    for item in items.values() {
        index.entry(item.parent_id).or_default().push(item.id);
    }
    for group in index.values_mut() {
        group.sort_by_key(|id| items[id].order_index);
    }
    index
}

/// Derived sequence number for every item: the dotted path of
/// (position + 1) values from its root.
#[must_use]
pub fn sequence_numbers(
    items: &HashMap<WorkItemId, WorkItem>,
) -> HashMap<WorkItemId, String> {
    let index = children_index(items);
    let mut sequences = HashMap::with_capacity(items.len());
    let mut stack: Vec<(WorkItemId, String)> = Vec::new();
    if let Some(roots) = index.get(&None) {
        for (position, id) in roots.iter().enumerate() {
            stack.push((*id, (position + 1).to_string()));
        }
    }
    while let Some((id, sequence)) = stack.pop() {
        if let Some(children) = index.get(&Some(id)) {
            for (position, child) in children.iter().enumerate() {
                stack.push((*child, format!("{sequence}.{}", position + 1)));
            }
        }
        sequences.insert(id, sequence);
    }
    sequences
}

/// Whether making `child` a child of `new_parent` would create a cycle.
#[must_use]
pub fn would_cycle(
    items: &HashMap<WorkItemId, WorkItem>,
    child: WorkItemId,
    new_parent: WorkItemId,
) -> bool {
    if child == new_parent {
        return true;
    }
    let mut cursor = Some(new_parent);
    while let Some(id) = cursor {
        if id == child {
            return true;
        }
        cursor = items.get(&id).and_then(|item| item.parent_id);
    }
    false
}

/// Ancestor chain of an item, nearest parent first.
#[must_use]
pub fn ancestors(
    items: &HashMap<WorkItemId, WorkItem>,
    id: WorkItemId,
) -> Vec<WorkItemId> {
    let mut chain = Vec::new();
    let mut cursor = items.get(&id).and_then(|item| item.parent_id);
    while let Some(parent) = cursor {
        chain.push(parent);
        cursor = items.get(&parent).and_then(|item| item.parent_id);
    }
    chain
}

/// Every id in the subtree rooted at `id`, including `id` itself.
#[must_use]
pub fn subtree_ids(
    items: &HashMap<WorkItemId, WorkItem>,
    id: WorkItemId,
) -> Vec<WorkItemId> {
    let index = children_index(items);
    let mut out = Vec::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        out.push(current);
        if let Some(children) = index.get(&Some(current)) {
            stack.extend(children.iter().copied());
        }
    }
    out
}

/// Rewrite `order_index` to a dense 0-based sequence for one sibling group,
/// returning the ids whose index actually changed.
pub fn densify_group(
    items: &mut HashMap<WorkItemId, WorkItem>,
    parent: Option<WorkItemId>,
    now: DateTime<Utc>,
) -> Vec<WorkItemId> {
    let mut group: Vec<WorkItemId> = items
        .values()
        .filter(|item| item.parent_id == parent)
        .map(|item| item.id)
        .collect();
    group.sort_by_key(|id| items[id].order_index);
    let mut changed = Vec::new();
    for (position, id) in group.iter().enumerate() {
        let item = items.get_mut(id).filter(|item| item.order_index != position);
        if let Some(item) = item {
            item.order_index = position;
            item.updated_at = now;
            changed.push(*id);
        }
    }
    changed
}

/// Walk from `start_parent` to the root, recomputing each node's progress
/// and (unless overridden) status from its children. Stops early when a
/// node's recomputed values equal its stored values. Returns the ids that
/// changed, nearest first.
pub fn propagate_from(
    items: &mut HashMap<WorkItemId, WorkItem>,
    start_parent: Option<WorkItemId>,
    now: DateTime<Utc>,
) -> Vec<WorkItemId> {
    let mut changed = Vec::new();
    let mut cursor = start_parent;
    while let Some(id) = cursor {
        let Some(node) = items.get(&id) else { break };
        let parent_of_node = node.parent_id;

        let children: Vec<(WorkItemStatus, f64)> = items
            .values()
            .filter(|item| item.parent_id == Some(id))
            .map(|item| (item.status, item.progress))
            .collect();

        let (new_status, new_progress) = if children.is_empty() {
            // The node became a leaf (its last child was removed); its own
            // status now drives its progress again.
            let node = &items[&id];
            (node.status, node.status.leaf_progress())
        } else {
            let statuses: Vec<WorkItemStatus> =
                children.iter().map(|(status, _)| *status).collect();
            let status = if items[&id].status_override {
                items[&id].status
            } else {
                derive_parent_status(&statuses)
            };
            (status, derive_parent_progress(&children))
        };

        let node = items.get_mut(&id).filter(|node| {
            node.status != new_status || (node.progress - new_progress).abs() > PROGRESS_EPSILON
        });
        let Some(node) = node else { break };
        node.status = new_status;
        node.progress = new_progress;
        node.updated_at = now;
        changed.push(id);
        cursor = parent_of_node;
    }
    changed
}

/// Recompute every derived value in a namespace bottom-up: leaf progress
/// from status, then non-leaf progress and status deepest-first. Used after
/// bulk imports, where per-mutation propagation never ran. Returns the ids
/// that changed.
pub fn recompute_all(
    items: &mut HashMap<WorkItemId, WorkItem>,
    now: DateTime<Utc>,
) -> Vec<WorkItemId> {
    let index = children_index(items);
    let mut depth: HashMap<WorkItemId, usize> = HashMap::new();
    let mut stack: Vec<(WorkItemId, usize)> = index
        .get(&None)
        .map(|roots| roots.iter().map(|id| (*id, 0)).collect())
        .unwrap_or_default();
    while let Some((id, d)) = stack.pop() {
        depth.insert(id, d);
        if let Some(children) = index.get(&Some(id)) {
            stack.extend(children.iter().map(|child| (*child, d + 1)));
        }
    }

    let mut order: Vec<WorkItemId> = depth.keys().copied().collect();
    order.sort_by_key(|id| std::cmp::Reverse(depth[id]));

    let mut changed = Vec::new();
    for id in order {
        let is_leaf = index.get(&Some(id)).is_none_or(Vec::is_empty);
        let (new_status, new_progress) = if is_leaf {
            let node = &items[&id];
            (node.status, node.status.leaf_progress())
        } else {
            let children: Vec<(WorkItemStatus, f64)> = index[&Some(id)]
                .iter()
                .map(|child| (items[child].status, items[child].progress))
                .collect();
            let statuses: Vec<WorkItemStatus> =
                children.iter().map(|(status, _)| *status).collect();
            let status = if items[&id].status_override {
                items[&id].status
            } else {
                derive_parent_status(&statuses)
            };
            (status, derive_parent_progress(&children))
        };
        let node = items.get_mut(&id).filter(|node| {
            node.status != new_status || (node.progress - new_progress).abs() > PROGRESS_EPSILON
        });
        if let Some(node) = node {
            node.status = new_status;
            node.progress = new_progress;
            node.updated_at = now;
            changed.push(id);
        }
    }
    changed
}
