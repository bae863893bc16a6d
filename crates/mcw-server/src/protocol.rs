//! JSON-RPC 2.0 frames and the MCP-style method payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mcw_domain::entities::ClientInfo;
use mcw_domain::error::Error;

/// JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revision negotiated at `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Server name reported in `serverInfo`.
pub const SERVER_NAME: &str = "mcw";

/// Server version reported in `serverInfo`.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse error (-32700).
pub const CODE_PARSE_ERROR: i64 = -32700;
/// Invalid request shape (-32600).
pub const CODE_INVALID_REQUEST: i64 = -32600;
/// Unknown method (-32601).
pub const CODE_METHOD_NOT_FOUND: i64 = -32601;
/// Invalid params (-32602).
pub const CODE_INVALID_PARAMS: i64 = -32602;
/// Internal error (-32603).
pub const CODE_INTERNAL: i64 = -32603;
/// Application-level error carrying a taxonomy code in `data.code`.
pub const CODE_APPLICATION: i64 = -32000;

/// One incoming JSON-RPC frame. A frame without an `id` is a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol marker, must be "2.0"
    pub jsonrpc: String,
    /// Request id; absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Whether this frame expects a response.
    #[must_use]
    pub fn expects_response(&self) -> bool {
        self.id.is_some()
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code
    pub code: i64,
    /// Human message (no internal details)
    pub message: String,
    /// Structured data; carries `code` from the error taxonomy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// One outgoing JSON-RPC response frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol marker
    pub jsonrpc: String,
    /// Mirrors the request id
    pub id: Value,
    /// Success payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Build a success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    #[must_use]
    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// One outgoing notification frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Protocol marker
    pub jsonrpc: String,
    /// Method name (e.g. `notifications/work_item_update`)
    pub method: String,
    /// Payload
    pub params: Value,
}

impl JsonRpcNotification {
    /// Build a notification frame.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            method: method.into(),
            params,
        }
    }
}

/// Map a domain error to the wire error object. Stack traces and sources
/// never cross this boundary; the taxonomy code travels in `data.code`.
#[must_use]
pub fn map_error(error: &Error) -> JsonRpcError {
    let code = match error {
        Error::Validation { .. } => CODE_INVALID_PARAMS,
        Error::Transport { .. } => CODE_INVALID_REQUEST,
        Error::Internal { .. } | Error::Io { .. } | Error::Json { .. } => CODE_INTERNAL,
        _ => CODE_APPLICATION,
    };
    let message = match error {
        Error::Internal { .. } | Error::Io { .. } | Error::Json { .. } | Error::Store { .. } => {
            // Logged upstream with a correlation id; clients get a summary.
            "internal error".to_owned()
        }
        other => other.to_string(),
    };
    JsonRpcError {
        code,
        message,
        data: Some(serde_json::json!({ "code": error.code() })),
    }
}

/// `initialize` request parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Client protocol revision
    #[serde(default)]
    pub protocol_version: String,
    /// Client identity
    #[serde(default)]
    pub client_info: ClientInfo,
    /// Client capabilities (opaque)
    #[serde(default)]
    pub capabilities: Value,
    /// Stdio handshake namespace option
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// `initialize` result payload.
#[must_use]
pub fn initialize_result() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
        "capabilities": { "tools": {} },
    })
}

/// Wrap a tool result in the `tools/call` content envelope.
///
/// # Errors
///
/// Returns an error when the result cannot be serialized.
pub fn call_tool_envelope(result: &Value) -> mcw_domain::error::Result<Value> {
    let text = serde_json::to_string(result)?;
    Ok(serde_json::json!({
        "content": [{ "type": "text", "text": text }],
        "isError": false,
    }))
}
