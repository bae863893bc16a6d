//! Shared request handling core.
//!
//! Every transport parses frames its own way, then hands requests here.
//! The core owns the `initialize` handshake, `tools/list`, `tools/call`
//! (including the body-namespace binding check), and error mapping.

use std::sync::Arc;

use serde_json::Value;

use mcw_domain::entities::Session;
use mcw_domain::error::Error;
use mcw_domain::value_objects::{Namespace, SessionId};

use crate::notifier::Notifier;
use crate::protocol::{
    call_tool_envelope, initialize_result, map_error, InitializeParams, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, CODE_INVALID_REQUEST, CODE_METHOD_NOT_FOUND,
    JSONRPC_VERSION,
};
use crate::session::{check_body_namespace, NamespaceIntent, SessionManager};
use crate::tools::{tool_descriptors, Dispatcher};

/// Outcome of handling one frame.
pub struct HandleOutcome {
    /// Response to send, when the frame expected one
    pub response: Option<JsonRpcResponse>,
    /// The session must be closed (binding violation)
    pub close_session: bool,
}

impl HandleOutcome {
    fn respond(response: Option<JsonRpcResponse>) -> Self {
        Self {
            response,
            close_session: false,
        }
    }
}

/// Transport-independent request core.
pub struct RpcCore {
    /// Tool dispatcher
    pub dispatcher: Dispatcher,
    /// Session table
    pub sessions: Arc<SessionManager>,
    /// Notification hub
    pub notifier: Arc<Notifier>,
}

impl RpcCore {
    /// Wire the core.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, sessions: Arc<SessionManager>, notifier: Arc<Notifier>) -> Self {
        Self {
            dispatcher,
            sessions,
            notifier,
        }
    }

    fn invalid_request(id: Value, message: &str) -> JsonRpcResponse {
        JsonRpcResponse::failure(
            id,
            JsonRpcError {
                code: CODE_INVALID_REQUEST,
                message: message.to_owned(),
                data: None,
            },
        )
    }

    /// Handle `initialize`: bind the namespace and open the session.
    ///
    /// `intent` carries the transport-level namespace sources; a stdio
    /// handshake option inside the params fills the handshake slot.
    ///
    /// # Errors
    ///
    /// Returns the wire error when the namespace intent is invalid.
    pub async fn initialize(
        &self,
        params: Value,
        mut intent: NamespaceIntent,
    ) -> Result<(Session, Value), JsonRpcError> {
        let params: InitializeParams =
            serde_json::from_value(params).unwrap_or_default();
        if intent.handshake.is_none() {
            intent.handshake = params.namespace.clone();
        }
        let namespace = self
            .sessions
            .resolve_namespace(&intent)
            .map_err(|e| map_error(&e))?;
        let session = self
            .sessions
            .open(namespace, params.protocol_version, params.client_info)
            .await;
        self.notifier
            .register(session.id, session.namespace.clone());
        mcw_domain::info!(
            "session",
            "session opened",
            &format!("{} -> {}", session.id, session.namespace)
        );
        Ok((session, initialize_result()))
    }

    /// Handle a frame on an already-initialized session.
    pub async fn handle(&self, session_id: SessionId, request: JsonRpcRequest) -> HandleOutcome {
        let id = request.id.clone().unwrap_or(Value::Null);
        if request.jsonrpc != JSONRPC_VERSION {
            return HandleOutcome::respond(Some(Self::invalid_request(
                id,
                "jsonrpc must be \"2.0\"",
            )));
        }
        let Some(session) = self.sessions.get(session_id).await else {
            return HandleOutcome::respond(Some(Self::invalid_request(
                id,
                "unknown or expired session; call initialize first",
            )));
        };

        match request.method.as_str() {
            "tools/list" => {
                let tools: Vec<Value> = tool_descriptors()
                    .into_iter()
                    .map(|descriptor| {
                        serde_json::json!({
                            "name": descriptor.name,
                            "description": descriptor.description,
                            "inputSchema": descriptor.input_schema,
                        })
                    })
                    .collect();
                HandleOutcome::respond(Some(JsonRpcResponse::success(
                    id,
                    serde_json::json!({ "tools": tools }),
                )))
            }
            "tools/call" => self.call_tool(&session, id, request.params).await,
            "ping" => HandleOutcome::respond(Some(JsonRpcResponse::success(
                id,
                serde_json::json!({}),
            ))),
            // Client-side notifications need no reply.
            _ if !request.expects_response() => HandleOutcome::respond(None),
            other => HandleOutcome::respond(Some(JsonRpcResponse::failure(
                id,
                JsonRpcError {
                    code: CODE_METHOD_NOT_FOUND,
                    message: format!("unknown method '{other}'"),
                    data: None,
                },
            ))),
        }
    }

    async fn call_tool(&self, session: &Session, id: Value, params: Value) -> HandleOutcome {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        if name.is_empty() {
            return HandleOutcome::respond(Some(Self::invalid_request(
                id,
                "tools/call requires a tool name",
            )));
        }

        // The binder attaches the namespace; bodies may not contradict it.
        if let Err(error) = check_body_namespace(&session.namespace, &arguments) {
            mcw_domain::warn!(
                "session",
                "namespace binding violated, closing session",
                &session.id
            );
            self.sessions.close(session.id).await;
            self.notifier.unregister(session.id);
            return HandleOutcome {
                response: Some(JsonRpcResponse::failure(id, map_error(&error))),
                close_session: true,
            };
        }

        match self
            .dispatcher
            .call_tool(&session.namespace, &name, arguments)
            .await
        {
            Ok(result) => match call_tool_envelope(&result) {
                Ok(envelope) => {
                    HandleOutcome::respond(Some(JsonRpcResponse::success(id, envelope)))
                }
                Err(error) => HandleOutcome::respond(Some(JsonRpcResponse::failure(
                    id,
                    map_error(&error),
                ))),
            },
            Err(error) => {
                Self::log_failure(&name, &error);
                HandleOutcome::respond(Some(JsonRpcResponse::failure(id, map_error(&error))))
            }
        }
    }

    fn log_failure(tool: &str, error: &Error) {
        match error {
            Error::Internal { .. } | Error::Io { .. } | Error::Json { .. } | Error::Store { .. } => {
                let correlation = mcw_domain::utils::generate();
                tracing::error!(tool, %correlation, %error, "tool call failed internally");
            }
            _ => {
                tracing::debug!(tool, %error, "tool call rejected");
            }
        }
    }

    /// Close a session and drop its notification queue.
    pub async fn close_session(&self, session_id: SessionId) {
        self.sessions.close(session_id).await;
        self.notifier.unregister(session_id);
    }

    /// Resolve a namespace for transports that bind before `initialize`
    /// (WebSocket path binding).
    ///
    /// # Errors
    ///
    /// Returns the wire error for an invalid namespace name.
    pub fn resolve_namespace(&self, intent: &NamespaceIntent) -> Result<Namespace, JsonRpcError> {
        self.sessions
            .resolve_namespace(intent)
            .map_err(|e| map_error(&e))
    }
}
