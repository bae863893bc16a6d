//! Configuration value types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which transport frontends the server starts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransportMode {
    /// Line-delimited JSON-RPC on stdin/stdout; one session per process
    Stdio,
    /// HTTP POST + SSE only
    Http,
    /// WebSocket only
    Websocket,
    /// HTTP, SSE, and WebSocket on one listener
    Combined,
}

/// Network binding for the HTTP/WebSocket frontends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Transport selection
    pub mode: TransportMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3510,
            mode: TransportMode::Combined,
        }
    }
}

/// Which embedding provider backs the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Deterministic feature-hash embedder (no external dependency)
    Hash,
    /// Local Ollama server
    Ollama,
}

/// Embedding provider selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider backend
    pub backend: EmbeddingBackend,
    /// Vector dimension D
    pub dimensions: usize,
    /// Ollama base URL (ollama backend only)
    pub ollama_url: String,
    /// Ollama model name (ollama backend only)
    pub ollama_model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Hash,
            dimensions: 384,
            ollama_url: "http://localhost:11434".to_owned(),
            ollama_model: "nomic-embed-text".to_owned(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Network binding and transport selection
    pub server: ServerConfig,
    /// Default namespace for stdio sessions
    pub namespace_default: String,
    /// Data directory for the vector store
    pub vector_store_path: PathBuf,
    /// Embedding provider selection
    pub embedding: EmbeddingConfig,
    /// Per-operation deadline in seconds
    pub request_timeout_secs: u64,
    /// Max in-flight operations across all sessions
    pub max_concurrent: usize,
    /// Log verbosity (tracing env-filter syntax)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            namespace_default: "default".to_owned(),
            vector_store_path: PathBuf::from("./data"),
            embedding: EmbeddingConfig::default(),
            request_timeout_secs: 30,
            max_concurrent: 64,
            log_level: "info".to_owned(),
        }
    }
}
