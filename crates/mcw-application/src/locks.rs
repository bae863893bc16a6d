//! Per-namespace mutation locks.
//!
//! Mutations within one namespace are serialized; namespaces are fully
//! parallel. Embeddings are computed before the lock is taken, so the
//! critical section suspends only on vector store I/O.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use mcw_domain::value_objects::Namespace;

/// Registry of one mutex per namespace, created on first use.
#[derive(Default)]
pub struct NamespaceLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl NamespaceLocks {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the mutation lock for a namespace.
    pub async fn acquire(&self, namespace: &Namespace) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(namespace.as_str().to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }
}
