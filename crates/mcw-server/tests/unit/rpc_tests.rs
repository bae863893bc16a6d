//! RPC core tests: handshake, tools/list, binding enforcement.

use std::sync::Arc;

use serde_json::{json, Value};

use mcw_infrastructure::{AppConfig, AppContext};
use mcw_server::protocol::{JsonRpcRequest, JSONRPC_VERSION};
use mcw_server::session::NamespaceIntent;
use mcw_server::transport::build_core;
use mcw_server::RpcCore;

fn core(dir: &tempfile::TempDir) -> Arc<RpcCore> {
    let config = AppConfig {
        vector_store_path: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let ctx = AppContext::build(config).expect("context");
    build_core(ctx).expect("core")
}

fn request(method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: JSONRPC_VERSION.to_owned(),
        id: Some(json!(1)),
        method: method.to_owned(),
        params,
    }
}

#[tokio::test]
async fn initialize_binds_namespace_and_reports_server_info() {
    let dir = tempfile::tempdir().expect("tempdir");
    let core = core(&dir);
    let intent = NamespaceIntent {
        header: Some("alpha".to_owned()),
        ..Default::default()
    };
    let (session, result) = core
        .initialize(
            json!({ "protocolVersion": "2025-06-18", "clientInfo": { "name": "test", "version": "0" } }),
            intent,
        )
        .await
        .expect("initialize");
    assert_eq!(session.namespace.as_str(), "alpha");
    assert_eq!(result["serverInfo"]["name"], "mcw");
    assert!(result["protocolVersion"].is_string());
}

#[tokio::test]
async fn tools_list_exposes_schemas() {
    let dir = tempfile::tempdir().expect("tempdir");
    let core = core(&dir);
    let (session, _) = core
        .initialize(json!({}), NamespaceIntent::default())
        .await
        .expect("initialize");

    let outcome = core.handle(session.id, request("tools/list", Value::Null)).await;
    let response = outcome.response.expect("response");
    let tools = response.result.expect("result")["tools"]
        .as_array()
        .expect("tools array")
        .clone();
    assert_eq!(tools.len(), 9);
    assert!(tools[0]["inputSchema"].is_object());
}

#[tokio::test]
async fn tools_call_wraps_results_in_content_envelope() {
    let dir = tempfile::tempdir().expect("tempdir");
    let core = core(&dir);
    let (session, _) = core
        .initialize(json!({}), NamespaceIntent::default())
        .await
        .expect("initialize");

    let outcome = core
        .handle(
            session.id,
            request(
                "tools/call",
                json!({
                    "name": "manage_work_item",
                    "arguments": { "action": "create", "type": "task", "title": "hello" }
                }),
            ),
        )
        .await;
    let response = outcome.response.expect("response");
    let result = response.result.expect("result");
    assert_eq!(result["isError"], false);
    let inner: Value =
        serde_json::from_str(result["content"][0]["text"].as_str().expect("text")).expect("json");
    assert_eq!(inner["title"], "hello");
}

#[tokio::test]
async fn domain_errors_map_to_rpc_errors_with_taxonomy_codes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let core = core(&dir);
    let (session, _) = core
        .initialize(json!({}), NamespaceIntent::default())
        .await
        .expect("initialize");

    let outcome = core
        .handle(
            session.id,
            request(
                "tools/call",
                json!({
                    "name": "get_work_item",
                    "arguments": { "work_item_id": "00000000-0000-4000-8000-000000000000" }
                }),
            ),
        )
        .await;
    let response = outcome.response.expect("response");
    let error = response.error.expect("error");
    assert_eq!(error.data.expect("data")["code"], "ErrNotFound");
}

#[tokio::test]
async fn body_namespace_contradiction_closes_the_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let core = core(&dir);
    let intent = NamespaceIntent {
        header: Some("alpha".to_owned()),
        ..Default::default()
    };
    let (session, _) = core.initialize(json!({}), intent).await.expect("initialize");

    let outcome = core
        .handle(
            session.id,
            request(
                "tools/call",
                json!({
                    "name": "search_content",
                    "arguments": { "query": "x", "namespace": "beta" }
                }),
            ),
        )
        .await;
    assert!(outcome.close_session);
    let error = outcome.response.expect("response").error.expect("error");
    assert_eq!(error.data.expect("data")["code"], "ErrNamespaceBinding");

    // The session is gone: the next call is rejected.
    let after = core
        .handle(session.id, request("tools/list", Value::Null))
        .await;
    let response = after.response.expect("response");
    assert!(response.error.is_some());
}

#[tokio::test]
async fn namespace_isolation_across_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let core = core(&dir);
    let (alpha, _) = core
        .initialize(
            json!({}),
            NamespaceIntent {
                header: Some("alpha".to_owned()),
                ..Default::default()
            },
        )
        .await
        .expect("alpha session");
    let (beta, _) = core
        .initialize(
            json!({}),
            NamespaceIntent {
                header: Some("beta".to_owned()),
                ..Default::default()
            },
        )
        .await
        .expect("beta session");

    // Create X in alpha.
    let outcome = core
        .handle(
            alpha.id,
            request(
                "tools/call",
                json!({
                    "name": "manage_work_item",
                    "arguments": { "action": "create", "type": "task", "title": "X" }
                }),
            ),
        )
        .await;
    let created: Value = serde_json::from_str(
        outcome.response.expect("response").result.expect("result")["content"][0]["text"]
            .as_str()
            .expect("text"),
    )
    .expect("json");
    let x_id = created["id"].as_str().expect("id").to_owned();

    // Fetching X from beta fails; searching finds nothing.
    let outcome = core
        .handle(
            beta.id,
            request(
                "tools/call",
                json!({ "name": "get_work_item", "arguments": { "work_item_id": x_id } }),
            ),
        )
        .await;
    let error = outcome.response.expect("response").error.expect("error");
    assert_eq!(error.data.expect("data")["code"], "ErrNotFound");

    let outcome = core
        .handle(
            beta.id,
            request(
                "tools/call",
                json!({ "name": "search_content", "arguments": { "query": "X", "search_type": "hybrid" } }),
            ),
        )
        .await;
    let result: Value = serde_json::from_str(
        outcome.response.expect("response").result.expect("result")["content"][0]["text"]
            .as_str()
            .expect("text"),
    )
    .expect("json");
    assert_eq!(result["total_found"], 0);
}

#[tokio::test]
async fn unknown_methods_are_method_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let core = core(&dir);
    let (session, _) = core
        .initialize(json!({}), NamespaceIntent::default())
        .await
        .expect("initialize");

    let outcome = core
        .handle(session.id, request("tools/destroy", Value::Null))
        .await;
    let error = outcome.response.expect("response").error.expect("error");
    assert_eq!(error.code, -32601);
}
