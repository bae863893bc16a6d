//! Common macros used across the domain and downstream layers.

/// Strong-typed identifier macros
pub mod entities;
/// Log facade macros
pub mod logging;
