//! Progress notifier.
//!
//! Subscribes to the domain event bus and fans events out to per-session
//! bounded queues. A full queue drops its oldest entry and flags the
//! session for resync; the flag rides on the next delivered notification so
//! the client knows to refetch. Delivery order per namespace follows
//! publish order, which follows mutation order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use futures::StreamExt;
use tokio::sync::Notify;

use mcw_domain::events::DomainEvent;
use mcw_domain::ports::EventBusProvider;
use mcw_domain::value_objects::{Namespace, SessionId};

use crate::protocol::JsonRpcNotification;

/// Bounded queue capacity per session.
const SESSION_QUEUE_CAPACITY: usize = 64;

/// Wire method for work item change notifications.
pub const WORK_ITEM_UPDATE_METHOD: &str = "notifications/work_item_update";

struct SessionQueue {
    namespace: Namespace,
    queue: Mutex<VecDeque<JsonRpcNotification>>,
    needs_resync: AtomicBool,
    wakeup: Notify,
}

/// Fan-out hub from the event bus to subscribed sessions.
pub struct Notifier {
    queues: DashMap<SessionId, Arc<SessionQueue>>,
}

impl Notifier {
    /// Build an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
        }
    }

    /// Start consuming the event bus. Runs until the bus closes.
    pub fn spawn(self: &Arc<Self>, bus: Arc<dyn EventBusProvider>) {
        let notifier = Arc::clone(self);
        tokio::spawn(async move {
            let mut stream = match bus.subscribe_events().await {
                Ok(stream) => stream,
                Err(error) => {
                    tracing::error!(%error, "notifier failed to subscribe to the event bus");
                    return;
                }
            };
            while let Some(event) = stream.next().await {
                notifier.publish(&event);
            }
        });
    }

    /// Subscribe a session. Idempotent per session id.
    pub fn register(&self, session_id: SessionId, namespace: Namespace) {
        self.queues.entry(session_id).or_insert_with(|| {
            Arc::new(SessionQueue {
                namespace,
                queue: Mutex::new(VecDeque::new()),
                needs_resync: AtomicBool::new(false),
                wakeup: Notify::new(),
            })
        });
    }

    /// Drop a session's queue.
    pub fn unregister(&self, session_id: SessionId) {
        self.queues.remove(&session_id);
    }

    /// Build the wire notification for one domain event.
    fn notification(event: &DomainEvent, needs_resync: bool) -> JsonRpcNotification {
        let params = match event {
            DomainEvent::WorkItemsChanged {
                namespace,
                changed_ids,
                at,
            } => serde_json::json!({
                "namespace": namespace,
                "changed_ids": changed_ids,
                "at": at,
                "needs_resync": needs_resync,
            }),
            DomainEvent::WorkItemsDeleted {
                namespace,
                deleted_ids,
                at,
            } => serde_json::json!({
                "namespace": namespace,
                "deleted_ids": deleted_ids,
                "at": at,
                "needs_resync": needs_resync,
            }),
        };
        JsonRpcNotification::new(WORK_ITEM_UPDATE_METHOD, params)
    }

    /// Fan one event out to every session bound to its namespace.
    pub fn publish(&self, event: &DomainEvent) {
        for entry in self.queues.iter() {
            let session_queue = entry.value();
            if &session_queue.namespace != event.namespace() {
                continue;
            }
            let resync = session_queue.needs_resync.swap(false, Ordering::AcqRel);
            let notification = Self::notification(event, resync);
            {
                let mut queue = session_queue.queue.lock().unwrap_or_else(|e| e.into_inner());
                if queue.len() >= SESSION_QUEUE_CAPACITY {
                    queue.pop_front();
                    session_queue.needs_resync.store(true, Ordering::Release);
                }
                queue.push_back(notification);
            }
            session_queue.wakeup.notify_one();
        }
    }

    /// Drain every queued notification for a session (may be empty).
    pub fn drain(&self, session_id: SessionId) -> Vec<JsonRpcNotification> {
        let Some(entry) = self.queues.get(&session_id) else {
            return Vec::new();
        };
        let mut queue = entry.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.drain(..).collect()
    }

    /// Wait until the session has at least one queued notification, then
    /// drain. Returns empty when the session is not registered.
    pub async fn wait_and_drain(&self, session_id: SessionId) -> Vec<JsonRpcNotification> {
        loop {
            let Some(entry) = self.queues.get(&session_id) else {
                return Vec::new();
            };
            let queue = Arc::clone(entry.value());
            drop(entry);
            {
                let mut locked = queue.queue.lock().unwrap_or_else(|e| e.into_inner());
                if !locked.is_empty() {
                    return locked.drain(..).collect();
                }
            }
            queue.wakeup.notified().await;
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
