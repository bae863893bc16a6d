//! In-process domain event bus backed by a broadcast channel.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::broadcast;

use mcw_domain::error::Result;
use mcw_domain::events::DomainEvent;
use mcw_domain::ports::{DomainEventStream, EventBusProvider};

const EVENT_BUS_BUFFER_SIZE: usize = 256;

/// Broadcast-channel event bus; every subscriber sees every event
/// published after it subscribed.
#[derive(Clone)]
pub struct BroadcastEventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl BroadcastEventBus {
    /// Create a new event bus with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_BUFFER_SIZE);
        Self {
            sender: Arc::new(sender),
        }
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BroadcastEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastEventBus")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[async_trait]
impl EventBusProvider for BroadcastEventBus {
    async fn publish_event(&self, event: DomainEvent) -> Result<()> {
        match self.sender.send(event) {
            Ok(count) => {
                mcw_domain::debug!("event_bus", &format!("published event to {count} subscribers"));
            }
            Err(_) => mcw_domain::debug!("event_bus", "published event but no subscribers"),
        }
        Ok(())
    }

    async fn subscribe_events(&self) -> Result<DomainEventStream> {
        let receiver = self.sender.subscribe();
        let stream = stream::unfold(receiver, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        mcw_domain::warn!("event_bus", "event stream lagged", &format!("{n} events"));
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }

    fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}
