//! Session table and namespace binder.
//!
//! A session is bound to exactly one namespace at handshake and the binding
//! never changes. Namespace intent sources are honored in a fixed
//! precedence: URL path, then header, then WebSocket subprotocol, then the
//! environment default, then `"default"`. A later message contradicting the
//! binding fails with `ErrNamespaceBinding` and the session is closed.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use mcw_domain::entities::{ClientInfo, Session};
use mcw_domain::error::{Error, Result};
use mcw_domain::value_objects::{Namespace, SessionId};

/// Namespace intent presented at handshake, by source.
#[derive(Debug, Clone, Default)]
pub struct NamespaceIntent {
    /// URL path segment (`/mcp/{namespace}`)
    pub path: Option<String>,
    /// `X-Namespace` header
    pub header: Option<String>,
    /// WebSocket subprotocol parameter
    pub subprotocol: Option<String>,
    /// Stdio handshake option
    pub handshake: Option<String>,
}

/// In-process session table behind a reader-writer lock.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Session>>,
    default_namespace: Namespace,
}

impl SessionManager {
    /// Build a session table with the environment-default namespace.
    #[must_use]
    pub fn new(default_namespace: Namespace) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_namespace,
        }
    }

    /// Resolve the namespace to bind, honoring exactly one source:
    /// path > header > subprotocol > handshake option > env default.
    ///
    /// # Errors
    ///
    /// Returns `ErrValidation` when the winning intent is not a valid
    /// namespace name.
    pub fn resolve_namespace(&self, intent: &NamespaceIntent) -> Result<Namespace> {
        let winner = intent
            .path
            .as_deref()
            .or(intent.header.as_deref())
            .or(intent.subprotocol.as_deref())
            .or(intent.handshake.as_deref());
        match winner {
            Some(name) => Namespace::parse(name),
            None => Ok(self.default_namespace.clone()),
        }
    }

    /// Open a new session bound to `namespace`.
    pub async fn open(
        &self,
        namespace: Namespace,
        protocol_version: String,
        client_info: ClientInfo,
    ) -> Session {
        let session = Session {
            id: SessionId::new(),
            namespace,
            protocol_version,
            client_info,
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    /// Look up a session.
    pub async fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Close a session. Idempotent.
    pub async fn close(&self, id: SessionId) {
        self.sessions.write().await.remove(&id);
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is open.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Reject a message body that names a namespace other than the binding.
///
/// Downstream components never read namespaces from bodies; this check
/// exists purely to fail loudly when a client tries.
///
/// # Errors
///
/// Returns `ErrNamespaceBinding` on contradiction; the caller must close
/// the session.
pub fn check_body_namespace(bound: &Namespace, arguments: &Value) -> Result<()> {
    if let Some(claimed) = arguments.get("namespace").and_then(Value::as_str) {
        if claimed != bound.as_str() {
            return Err(Error::namespace_binding(format!(
                "session is bound to '{bound}', body names '{claimed}'"
            )));
        }
    }
    Ok(())
}
