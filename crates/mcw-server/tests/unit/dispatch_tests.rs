//! Dispatcher tests over a real application context.

use serde_json::json;

use mcw_domain::value_objects::Namespace;
use mcw_infrastructure::{AppConfig, AppContext};
use mcw_server::tools::{tool_descriptors, Dispatcher};

fn context(dir: &tempfile::TempDir) -> AppContext {
    let config = AppConfig {
        vector_store_path: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    AppContext::build(config).expect("context")
}

fn ns(name: &str) -> Namespace {
    Namespace::parse(name).expect("namespace")
}

#[test]
fn registry_lists_all_nine_operations() {
    let descriptors = tool_descriptors();
    let names: Vec<&str> = descriptors.iter().map(|d| d.name).collect();
    assert_eq!(
        names,
        [
            "manage_work_item",
            "get_work_item",
            "search_content",
            "get_hierarchy",
            "execute_work_item",
            "track_progress",
            "reorder_work_items",
            "sync_data",
            "memory",
        ]
    );
    for descriptor in &descriptors {
        assert!(descriptor.input_schema.is_object(), "{} schema", descriptor.name);
        assert!(!descriptor.description.is_empty());
    }
}

#[tokio::test]
async fn create_then_get_through_the_dispatcher() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dispatcher = Dispatcher::new(context(&dir));
    let demo = ns("demo");

    let created = dispatcher
        .call_tool(
            &demo,
            "manage_work_item",
            json!({ "action": "create", "type": "task", "title": "wire dispatcher" }),
        )
        .await
        .expect("create");
    let id = created["id"].as_str().expect("id").to_owned();

    let fetched = dispatcher
        .call_tool(
            &demo,
            "get_work_item",
            json!({ "work_item_id": id, "format": "detailed" }),
        )
        .await
        .expect("get");
    assert_eq!(fetched["item"]["title"], "wire dispatcher");
}

#[tokio::test]
async fn unknown_tool_is_a_validation_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dispatcher = Dispatcher::new(context(&dir));
    let err = dispatcher
        .call_tool(&ns("demo"), "definitely_not_a_tool", json!({}))
        .await
        .expect_err("unknown tool must fail");
    assert_eq!(err.code(), "ErrValidation");
}

#[tokio::test]
async fn malformed_arguments_are_validation_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dispatcher = Dispatcher::new(context(&dir));
    let err = dispatcher
        .call_tool(
            &ns("demo"),
            "manage_work_item",
            json!({ "action": "create", "type": "galaxy", "title": "x" }),
        )
        .await
        .expect_err("bad enum value must fail");
    assert_eq!(err.code(), "ErrValidation");
}

#[tokio::test]
async fn memory_kind_action_mismatch_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dispatcher = Dispatcher::new(context(&dir));
    let err = dispatcher
        .call_tool(
            &ns("demo"),
            "memory",
            json!({ "memory_type": "architecture", "action": "match", "problem": "x" }),
        )
        .await
        .expect_err("match on architecture must fail");
    assert_eq!(err.code(), "ErrValidation");
}

#[tokio::test]
async fn memory_round_trip_through_dispatcher() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dispatcher = Dispatcher::new(context(&dir));
    let demo = ns("demo");

    dispatcher
        .call_tool(
            &demo,
            "memory",
            json!({
                "memory_type": "troubleshoot",
                "action": "create",
                "slug": "cors",
                "title": "CORS failures",
                "ai_solutions": "Allow the origin.",
                "ai_use_case": ["CORS preflight failed"],
            }),
        )
        .await
        .expect("create");

    let read = dispatcher
        .call_tool(
            &demo,
            "memory",
            json!({ "memory_type": "troubleshoot", "action": "read", "slug": "cors" }),
        )
        .await
        .expect("read");
    assert_eq!(read["item"]["title"], "CORS failures");

    let matched = dispatcher
        .call_tool(
            &demo,
            "memory",
            json!({
                "memory_type": "troubleshoot",
                "action": "match",
                "problem": "CORS preflight 401",
            }),
        )
        .await
        .expect("match");
    assert_eq!(matched["matches"][0]["slug"], "cors");
}
