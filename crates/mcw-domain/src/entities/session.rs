//! Transport session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Namespace, SessionId};

/// Client identity presented at the `initialize` handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ClientInfo {
    /// Client program name
    #[serde(default)]
    pub name: String,
    /// Client program version
    #[serde(default)]
    pub version: String,
}

/// One transport connection bound to exactly one namespace.
///
/// The namespace is assigned at handshake and immutable for the life of the
/// session; any later message contradicting the binding fails the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier, minted at handshake
    pub id: SessionId,
    /// The bound namespace
    pub namespace: Namespace,
    /// Negotiated protocol version
    pub protocol_version: String,
    /// Client identity
    pub client_info: ClientInfo,
    /// Handshake timestamp (UTC)
    pub created_at: DateTime<Utc>,
}
