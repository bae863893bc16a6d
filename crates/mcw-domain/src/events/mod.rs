//! Domain events and the event-bus contract.

/// Event payload types
pub mod domain_events;

pub use domain_events::DomainEvent;
