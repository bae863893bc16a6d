//! # Infrastructure Layer
//!
//! Configuration loading and validation, logging bootstrap, the in-process
//! event bus, and explicit construction of the application services. There
//! are no process-global registries: `AppContext::build` wires everything
//! once at startup and the result is passed by reference.

/// Configuration types, loader, and validation
pub mod config;
/// Application context wiring
pub mod context;
/// Event bus implementation
pub mod events;
/// Logging bootstrap
pub mod logging;

pub use config::{AppConfig, ConfigLoader, EmbeddingBackend, TransportMode};
pub use context::AppContext;
pub use events::BroadcastEventBus;
