//! HTTP frontend: JSON-RPC POST, SSE notifications, WebSocket, the REST
//! façade, and the health endpoint. One router, one shared core.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{FromRequestParts, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use mcw_domain::error::{Error, Result};
use mcw_domain::value_objects::SessionId;
use mcw_infrastructure::config::ServerConfig;
use mcw_infrastructure::TransportMode;

use crate::protocol::{
    map_error, JsonRpcError, JsonRpcRequest, JsonRpcResponse, CODE_INVALID_REQUEST,
    CODE_PARSE_ERROR, SERVER_VERSION,
};
use crate::rpc::RpcCore;
use crate::session::NamespaceIntent;

/// Session id header for the HTTP transport.
pub const SESSION_HEADER: &str = "mcp-session-id";
/// Namespace intent header.
pub const NAMESPACE_HEADER: &str = "x-namespace";
/// WebSocket subprotocol prefix carrying a namespace parameter.
pub const WS_NAMESPACE_PROTOCOL_PREFIX: &str = "namespace.";

/// Shared state behind every HTTP handler.
pub struct HttpState {
    core: Arc<RpcCore>,
    mode: TransportMode,
}

/// Build the router over the shared core.
#[must_use]
pub fn router(core: Arc<RpcCore>, mode: TransportMode) -> Router {
    let state = Arc::new(HttpState { core, mode });
    Router::new()
        .route("/health", get(health))
        .route("/mcp", post(mcp_post).get(mcp_get))
        .route("/mcp/{namespace}", get(mcp_ws_with_namespace))
        .route("/api/memory", post(api_memory))
        .route("/api/search", get(api_search))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until shutdown.
///
/// # Errors
///
/// Returns `ErrTransport` when the listener fails to bind.
pub async fn serve(core: Arc<RpcCore>, server: &ServerConfig, mode: TransportMode) -> Result<()> {
    let app = router(core, mode);
    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port))
        .await
        .map_err(|e| {
            Error::transport(format!(
                "failed to bind {}:{}: {e}",
                server.host, server.port
            ))
        })?;
    tracing::info!(host = %server.host, port = server.port, %mode, "listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::transport(format!("server error: {e}")))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    header(headers, SESSION_HEADER)?.parse().ok()
}

fn rpc_error(code: i64, message: impl Into<String>) -> JsonRpcResponse {
    JsonRpcResponse::failure(
        Value::Null,
        JsonRpcError {
            code,
            message: message.into(),
            data: None,
        },
    )
}

async fn health(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": SERVER_VERSION,
        "mode": state.mode.to_string(),
    }))
}

async fn mcp_post(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if state.mode == TransportMode::Websocket {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            HeaderMap::new(),
            Json(rpc_error(CODE_INVALID_REQUEST, "POST disabled in websocket mode")),
        );
    }
    let request: JsonRpcRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::OK,
                HeaderMap::new(),
                Json(rpc_error(CODE_PARSE_ERROR, format!("malformed frame: {e}"))),
            );
        }
    };
    let id = request.id.clone().unwrap_or(Value::Null);

    if request.method == "initialize" {
        let intent = NamespaceIntent {
            header: header(&headers, NAMESPACE_HEADER).map(str::to_owned),
            ..Default::default()
        };
        return match state.core.initialize(request.params, intent).await {
            Ok((session, result)) => {
                let mut response_headers = HeaderMap::new();
                if let Ok(value) = session.id.as_str().parse() {
                    response_headers.insert(SESSION_HEADER, value);
                }
                (
                    StatusCode::OK,
                    response_headers,
                    Json(JsonRpcResponse::success(id, result)),
                )
            }
            Err(error) => (
                StatusCode::OK,
                HeaderMap::new(),
                Json(JsonRpcResponse::failure(id, error)),
            ),
        };
    }

    let Some(session_id) = session_from_headers(&headers) else {
        return (
            StatusCode::OK,
            HeaderMap::new(),
            Json(rpc_error(
                CODE_INVALID_REQUEST,
                "missing Mcp-Session-Id header; call initialize first",
            )),
        );
    };
    let outcome = state.core.handle(session_id, request).await;
    let response = outcome
        .response
        .unwrap_or_else(|| JsonRpcResponse::success(Value::Null, Value::Null));
    (StatusCode::OK, HeaderMap::new(), Json(response))
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    header(headers, "upgrade")
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}

async fn upgrade_to_ws(
    state: &HttpState,
    headers: &HeaderMap,
    request: Request,
    path_namespace: Option<String>,
) -> axum::response::Response {
    if state.mode == TransportMode::Http {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(rpc_error(CODE_INVALID_REQUEST, "websocket disabled in http mode")),
        )
            .into_response();
    }
    let (mut parts, _body) = request.into_parts();
    match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
        Ok(upgrade) => {
            let intent = ws_intent(headers, path_namespace);
            let core = state.core.clone();
            upgrade
                .on_upgrade(move |socket| ws_loop(socket, core, intent))
                .into_response()
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// GET /mcp is both the SSE stream and the non-namespaced WebSocket
/// endpoint; the upgrade header decides.
async fn mcp_get(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    request: Request,
) -> axum::response::Response {
    if is_websocket_upgrade(&headers) {
        upgrade_to_ws(&state, &headers, request, None).await
    } else {
        sse_stream(state, &headers).into_response()
    }
}

async fn mcp_ws_with_namespace(
    State(state): State<Arc<HttpState>>,
    Path(namespace): Path<String>,
    headers: HeaderMap,
    request: Request,
) -> axum::response::Response {
    if !is_websocket_upgrade(&headers) {
        return (
            StatusCode::BAD_REQUEST,
            Json(rpc_error(CODE_INVALID_REQUEST, "websocket upgrade required")),
        )
            .into_response();
    }
    upgrade_to_ws(&state, &headers, request, Some(namespace)).await
}

fn ws_intent(headers: &HeaderMap, path: Option<String>) -> NamespaceIntent {
    let subprotocol = header(headers, "sec-websocket-protocol").and_then(|protocols| {
        protocols
            .split(',')
            .map(str::trim)
            .find_map(|candidate| candidate.strip_prefix(WS_NAMESPACE_PROTOCOL_PREFIX))
            .map(str::to_owned)
    });
    NamespaceIntent {
        path,
        header: header(headers, NAMESPACE_HEADER).map(str::to_owned),
        subprotocol,
        handshake: None,
    }
}

fn sse_stream(
    state: Arc<HttpState>,
    headers: &HeaderMap,
) -> axum::response::Response {
    let Some(session_id) = session_from_headers(headers) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(rpc_error(
                CODE_INVALID_REQUEST,
                "missing Mcp-Session-Id header; call initialize first",
            )),
        )
            .into_response();
    };
    let stream: std::pin::Pin<Box<dyn Stream<Item = std::result::Result<Event, Infallible>> + Send>> =
        Box::pin(async_stream::stream! {
            loop {
                let batch = state.core.notifier.wait_and_drain(session_id).await;
                if batch.is_empty() {
                    // The session is gone; end the stream.
                    break;
                }
                for notification in batch {
                    let payload = serde_json::to_string(&notification).unwrap_or_default();
                    yield Ok(Event::default().event("message").data(payload));
                }
            }
        });
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

async fn ws_loop(mut socket: WebSocket, core: Arc<RpcCore>, intent: NamespaceIntent) {
    let mut session: Option<SessionId> = None;

    loop {
        tokio::select! {
            message = socket.recv() => {
                let Some(Ok(message)) = message else { break };
                let text = match message {
                    Message::Text(text) => text.to_string(),
                    Message::Close(_) => break,
                    _ => continue,
                };
                let request: JsonRpcRequest = match serde_json::from_str(&text) {
                    Ok(request) => request,
                    Err(e) => {
                        let response = rpc_error(CODE_PARSE_ERROR, format!("malformed frame: {e}"));
                        if send_json(&mut socket, &response).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };
                let id = request.id.clone().unwrap_or(Value::Null);

                if request.method == "initialize" {
                    match core.initialize(request.params, intent.clone()).await {
                        Ok((opened, result)) => {
                            session = Some(opened.id);
                            if send_json(&mut socket, &JsonRpcResponse::success(id, result))
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(error) => {
                            let _ = send_json(&mut socket, &JsonRpcResponse::failure(id, error)).await;
                            break;
                        }
                    }
                    continue;
                }

                let Some(current) = session else {
                    if request.expects_response() {
                        let response = rpc_error(CODE_INVALID_REQUEST, "call initialize first");
                        if send_json(&mut socket, &response).await.is_err() {
                            break;
                        }
                    }
                    continue;
                };

                let outcome = core.handle(current, request).await;
                if let Some(response) = outcome.response {
                    if send_json(&mut socket, &response).await.is_err() {
                        break;
                    }
                }
                if outcome.close_session {
                    break;
                }
            }
            batch = next_notifications(&core, session) => {
                for notification in batch {
                    if send_json(&mut socket, &notification).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    if let Some(id) = session {
        core.close_session(id).await;
    }
}

async fn next_notifications(
    core: &RpcCore,
    session: Option<SessionId>,
) -> Vec<crate::protocol::JsonRpcNotification> {
    match session {
        Some(id) => core.notifier.wait_and_drain(id).await,
        None => std::future::pending().await,
    }
}

async fn send_json<T: serde::Serialize>(
    socket: &mut WebSocket,
    value: &T,
) -> std::result::Result<(), axum::Error> {
    let text = serde_json::to_string(value).unwrap_or_default();
    socket.send(Message::Text(text.into())).await
}

// --- REST façade -----------------------------------------------------------

fn rest_status(error: &Error) -> StatusCode {
    match error.code() {
        "ErrNotFound" => StatusCode::NOT_FOUND,
        "ErrValidation" | "ErrHierarchy" | "ErrCycle" | "ErrOrderSet" | "ErrDerived" => {
            StatusCode::BAD_REQUEST
        }
        "ErrNamespaceBinding" => StatusCode::FORBIDDEN,
        "ErrConflict" => StatusCode::CONFLICT,
        "ErrTimeout" => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn rest_error(error: &Error) -> (StatusCode, Json<Value>) {
    let wire = map_error(error);
    (
        rest_status(error),
        Json(serde_json::json!({ "code": error.code(), "message": wire.message })),
    )
}

async fn rest_call(
    state: &HttpState,
    headers: &HeaderMap,
    tool: &str,
    arguments: Value,
) -> (StatusCode, Json<Value>) {
    let intent = NamespaceIntent {
        header: header(headers, NAMESPACE_HEADER).map(str::to_owned),
        ..Default::default()
    };
    let namespace = match state.core.sessions.resolve_namespace(&intent) {
        Ok(namespace) => namespace,
        Err(error) => return rest_error(&error),
    };
    match state
        .core
        .dispatcher
        .call_tool(&namespace, tool, arguments)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)),
        Err(error) => rest_error(&error),
    }
}

async fn api_memory(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    rest_call(&state, &headers, "memory", body).await
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    search_type: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

async fn api_search(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let mut arguments = serde_json::json!({ "query": query.q });
    if let Some(search_type) = query.search_type {
        arguments["search_type"] = Value::from(search_type);
    }
    if let Some(limit) = query.limit {
        arguments["limit"] = Value::from(limit);
    }
    rest_call(&state, &headers, "search_content", arguments).await
}
