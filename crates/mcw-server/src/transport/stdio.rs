//! Line-delimited JSON-RPC 2.0 on stdin/stdout.
//!
//! Exactly one session per process. The namespace comes from the
//! `initialize` handshake option when present, otherwise the environment
//! default. Notifications interleave with responses on stdout.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use mcw_domain::error::{Error, Result};
use mcw_domain::value_objects::SessionId;

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, CODE_PARSE_ERROR};
use crate::rpc::RpcCore;
use crate::session::NamespaceIntent;

async fn next_notifications(
    core: &RpcCore,
    session: Option<SessionId>,
) -> Vec<crate::protocol::JsonRpcNotification> {
    match session {
        Some(id) => core.notifier.wait_and_drain(id).await,
        None => std::future::pending().await,
    }
}

async fn write_json<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWriteExt + Unpin,
    T: serde::Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Run the stdio frontend until stdin closes.
///
/// # Errors
///
/// Returns transport errors on stdin/stdout I/O failure.
pub async fn run(core: Arc<RpcCore>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut session: Option<SessionId> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.map_err(|e| Error::transport(format!("stdin read failed: {e}")))? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let request: JsonRpcRequest = match serde_json::from_str(&line) {
                    Ok(request) => request,
                    Err(e) => {
                        let response = JsonRpcResponse::failure(
                            Value::Null,
                            JsonRpcError {
                                code: CODE_PARSE_ERROR,
                                message: format!("malformed JSON-RPC frame: {e}"),
                                data: None,
                            },
                        );
                        write_json(&mut stdout, &response).await?;
                        continue;
                    }
                };

                if request.method == "initialize" {
                    let id = request.id.clone().unwrap_or(Value::Null);
                    if session.is_some() {
                        let response = JsonRpcResponse::failure(
                            id,
                            JsonRpcError {
                                code: crate::protocol::CODE_INVALID_REQUEST,
                                message: "session already initialized".to_owned(),
                                data: None,
                            },
                        );
                        write_json(&mut stdout, &response).await?;
                        continue;
                    }
                    match core.initialize(request.params, NamespaceIntent::default()).await {
                        Ok((opened, result)) => {
                            session = Some(opened.id);
                            write_json(&mut stdout, &JsonRpcResponse::success(id, result)).await?;
                        }
                        Err(error) => {
                            write_json(&mut stdout, &JsonRpcResponse::failure(id, error)).await?;
                        }
                    }
                    continue;
                }

                let Some(current) = session else {
                    if request.expects_response() {
                        let response = JsonRpcResponse::failure(
                            request.id.clone().unwrap_or(Value::Null),
                            JsonRpcError {
                                code: crate::protocol::CODE_INVALID_REQUEST,
                                message: "call initialize first".to_owned(),
                                data: None,
                            },
                        );
                        write_json(&mut stdout, &response).await?;
                    }
                    continue;
                };

                let outcome = core.handle(current, request).await;
                if let Some(response) = outcome.response {
                    write_json(&mut stdout, &response).await?;
                }
                if outcome.close_session {
                    break;
                }
            }
            batch = next_notifications(&core, session) => {
                for notification in batch {
                    write_json(&mut stdout, &notification).await?;
                }
            }
        }
    }

    if let Some(id) = session {
        core.close_session(id).await;
    }
    Ok(())
}
