//! Configuration types, loader, and validation.

/// Loader (defaults + TOML file + environment)
pub mod loader;
/// Configuration value types
pub mod types;
/// Validation pass
pub mod validation;

pub use loader::ConfigLoader;
pub use types::{AppConfig, EmbeddingBackend, EmbeddingConfig, ServerConfig, TransportMode};
pub use validation::validate_config;
