//! Event bus implementation.

/// In-process broadcast bus
pub mod broadcast;

pub use broadcast::BroadcastEventBus;
