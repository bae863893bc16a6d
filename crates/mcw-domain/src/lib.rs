//! # Domain Layer
//!
//! Core business logic and domain types for the work-management service.
//! Contains only pure domain entities, value objects, ports, and business
//! rules. No transport, storage, or framework concerns.
//!
//! ## Architecture
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`entities`] | Core business entities with identity |
//! | [`value_objects`] | Immutable value objects (ids, namespace, embedding) |
//! | [`ops`] | Typed request/response payloads for the tool surface |
//! | [`ports`] | Provider and service port interfaces |
//! | [`events`] | Domain event types and the event-bus port |
//! | [`constants`] | Domain constants |
//! | [`error`] | Domain error types with stable wire codes |

/// Common macros
#[macro_use]
pub mod macros;

/// Domain-level constants
pub mod constants;
/// Core business entities with identity
pub mod entities;
/// Domain error types
pub mod error;
/// Domain events and event-bus contract
pub mod events;
/// Logging facade wiring (infra registers the sink)
pub mod infra;
/// Typed operation payloads for the tool surface
pub mod ops;
/// Provider and service port interfaces
pub mod ports;
/// Shared utility functions
pub mod utils;
/// Immutable value objects
pub mod value_objects;

pub use error::{Error, Result};
