//! Wire-shape tests for the work item entity.

use chrono::Utc;
use mcw_domain::entities::{Priority, WorkItem, WorkItemStatus, WorkItemType};
use mcw_domain::value_objects::{Namespace, WorkItemId};
use pretty_assertions::assert_eq;

fn sample_item() -> WorkItem {
    WorkItem {
        id: WorkItemId::new(),
        namespace: Namespace::default(),
        item_type: WorkItemType::Story,
        title: "Sample".to_owned(),
        description: "A sample story".to_owned(),
        status: WorkItemStatus::InProgress,
        priority: Priority::High,
        complexity: None,
        parent_id: None,
        order_index: 0,
        sequence_number: Some("1".to_owned()),
        progress: 0.5,
        acceptance_criteria: vec!["works".to_owned()],
        context_tags: vec!["sample".to_owned()],
        notes: String::new(),
        status_override: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn type_field_serializes_as_type() {
    let value = serde_json::to_value(sample_item()).expect("serialize");
    assert_eq!(value["type"], "story");
    assert_eq!(value["status"], "in_progress");
    assert_eq!(value["priority"], "high");
    // Absent optionals are omitted, not null.
    assert!(value.get("complexity").is_none());
    assert!(value.get("parent_id").is_none());
}

#[test]
fn item_round_trips_through_json() {
    let item = sample_item();
    let json = serde_json::to_string(&item).expect("serialize");
    let back: WorkItem = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.id, item.id);
    assert_eq!(back.item_type, item.item_type);
    assert_eq!(back.title, item.title);
    assert_eq!(back.order_index, item.order_index);
    assert_eq!(back.sequence_number, item.sequence_number);
}

#[test]
fn search_text_joins_title_and_description() {
    let item = sample_item();
    assert_eq!(item.search_text(), "Sample A sample story");
}
