//! Item payload shaping for `minimal`, `summary`, and `detailed` formats.

use serde_json::json;

use mcw_domain::entities::WorkItem;
use mcw_domain::ops::ItemFormat;

/// Shape one work item for the requested format.
///
/// `child_count` is the number of direct children (summary format reports
/// it so clients can decide whether to expand).
#[must_use]
pub fn shape_item(item: &WorkItem, format: ItemFormat, child_count: usize) -> serde_json::Value {
    match format {
        ItemFormat::Minimal => json!({
            "id": item.id,
            "type": item.item_type,
            "title": item.title,
            "status": item.status,
        }),
        ItemFormat::Summary => json!({
            "id": item.id,
            "type": item.item_type,
            "title": item.title,
            "status": item.status,
            "priority": item.priority,
            "progress": item.progress,
            "sequence_number": item.sequence_number,
            "parent_id": item.parent_id,
            "child_count": child_count,
            "updated_at": item.updated_at,
        }),
        ItemFormat::Detailed => {
            serde_json::to_value(item).unwrap_or_else(|_| json!({ "id": item.id }))
        }
    }
}
