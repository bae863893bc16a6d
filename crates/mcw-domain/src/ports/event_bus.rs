//! Event bus port.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::events::DomainEvent;

/// Stream of domain events delivered to a subscriber.
pub type DomainEventStream = Pin<Box<dyn Stream<Item = DomainEvent> + Send>>;

/// Publishes domain events to subscribed consumers.
///
/// Delivery is best-effort and at-least-once per subscriber; events for a
/// given namespace are published in mutation order.
#[async_trait]
pub trait EventBusProvider: Send + Sync {
    /// Publish one event to every subscriber.
    async fn publish_event(&self, event: DomainEvent) -> Result<()>;

    /// Open a new subscription starting at the current position.
    async fn subscribe_events(&self) -> Result<DomainEventStream>;

    /// Whether anyone is currently listening.
    fn has_subscribers(&self) -> bool;
}
