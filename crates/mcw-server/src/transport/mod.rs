//! Transport frontends.
//!
//! All frontends share one dispatcher, one session table, and one
//! notifier, built once by [`build_core`].

/// HTTP POST + SSE + WebSocket + REST façade
pub mod http;
/// Line-delimited JSON-RPC on stdin/stdout
pub mod stdio;

use std::sync::Arc;

use mcw_domain::error::Result;
use mcw_infrastructure::{AppContext, TransportMode};

use crate::notifier::Notifier;
use crate::rpc::RpcCore;
use crate::session::SessionManager;
use crate::tools::Dispatcher;

/// Build the shared request core from the application context.
///
/// # Errors
///
/// Returns a configuration error when the default namespace is invalid
/// (already caught by config validation in normal startup).
pub fn build_core(ctx: AppContext) -> Result<Arc<RpcCore>> {
    let default_namespace =
        mcw_domain::value_objects::Namespace::parse(&ctx.config.namespace_default)?;
    let sessions = Arc::new(SessionManager::new(default_namespace));
    let notifier = Arc::new(Notifier::new());
    notifier.spawn(ctx.event_bus.clone());
    let dispatcher = Dispatcher::new(ctx);
    Ok(Arc::new(RpcCore::new(dispatcher, sessions, notifier)))
}

/// Run the configured transport frontends until shutdown.
///
/// # Errors
///
/// Returns `ErrTransport` when the listener fails to bind; transport I/O
/// errors otherwise.
pub async fn serve(ctx: AppContext) -> Result<()> {
    let mode = ctx.config.server.mode;
    let core = build_core(ctx.clone())?;
    match mode {
        TransportMode::Stdio => stdio::run(core).await,
        TransportMode::Http | TransportMode::Websocket | TransportMode::Combined => {
            http::serve(core, &ctx.config.server, mode).await
        }
    }
}
