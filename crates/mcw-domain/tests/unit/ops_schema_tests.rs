//! Argument-schema generation tests for the tool surface.

use mcw_domain::ops::{
    GetHierarchyArgs, ManageWorkItemArgs, MemoryArgs, ReorderWorkItemsArgs, SearchContentArgs,
};

#[test]
fn every_argument_type_produces_a_schema() {
    let schemas = [
        serde_json::to_value(schemars::schema_for!(ManageWorkItemArgs)).expect("manage"),
        serde_json::to_value(schemars::schema_for!(SearchContentArgs)).expect("search"),
        serde_json::to_value(schemars::schema_for!(GetHierarchyArgs)).expect("hierarchy"),
        serde_json::to_value(schemars::schema_for!(ReorderWorkItemsArgs)).expect("reorder"),
        serde_json::to_value(schemars::schema_for!(MemoryArgs)).expect("memory"),
    ];
    for schema in schemas {
        assert!(schema.is_object(), "schema should be a JSON object");
    }
}

#[test]
fn unknown_action_is_rejected() {
    let json = serde_json::json!({ "action": "explode", "title": "x", "type": "task" });
    assert!(serde_json::from_value::<ManageWorkItemArgs>(json).is_err());
}

#[test]
fn hierarchy_defaults() {
    let args: GetHierarchyArgs = serde_json::from_value(serde_json::json!({})).expect("empty");
    assert!(args.include_completed);
    assert!(!args.include_cancelled);
    assert!(args.max_depth.is_none());
}
