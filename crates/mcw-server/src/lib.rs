//! # Server Layer
//!
//! JSON-RPC 2.0 protocol types, the tool dispatcher, the session/namespace
//! binder, the progress notifier, and the three transport frontends
//! (stdio, HTTP POST + SSE, WebSocket) plus a small REST façade. All
//! transports share one dispatcher and one session table.

/// Progress notifier
pub mod notifier;
/// JSON-RPC and MCP protocol types
pub mod protocol;
/// Shared request handling core
pub mod rpc;
/// Session table and namespace binder
pub mod session;
/// Tool registry and dispatch
pub mod tools;
/// Transport frontends
pub mod transport;

pub use rpc::RpcCore;
pub use session::SessionManager;
pub use tools::Dispatcher;
