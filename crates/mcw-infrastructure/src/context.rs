//! Application context wiring.
//!
//! Everything long-lived is constructed here, once, from the configuration.
//! Tests build a fresh context per namespace instead of sharing globals.

use std::sync::Arc;

use mcw_application::locks::NamespaceLocks;
use mcw_application::{
    MemoryServiceImpl, SearchServiceImpl, SyncServiceImpl, WorkItemServiceImpl,
};
use mcw_domain::error::Result;
use mcw_domain::ports::backup::NamespaceArchiver;
use mcw_domain::ports::{
    EmbeddingProvider, EventBusProvider, MemoryServiceInterface, SearchServiceInterface,
    SyncServiceInterface, VectorStore, WorkItemServiceInterface,
};
use mcw_providers::embedding::{HashEmbeddingProvider, OllamaEmbeddingProvider};
use mcw_providers::vector_store::FsVectorStore;

use crate::config::{AppConfig, EmbeddingBackend};
use crate::events::BroadcastEventBus;

/// Long-lived application state shared by every transport frontend.
#[derive(Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Arc<AppConfig>,
    /// Entity store
    pub store: Arc<dyn VectorStore>,
    /// Embedding provider
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Event bus
    pub event_bus: Arc<BroadcastEventBus>,
    /// Graph engine
    pub work_items: Arc<dyn WorkItemServiceInterface>,
    /// Work-item search
    pub search: Arc<dyn SearchServiceInterface>,
    /// Memory stores
    pub memory: Arc<dyn MemoryServiceInterface>,
    /// Namespace sync
    pub sync: Arc<dyn SyncServiceInterface>,
}

impl AppContext {
    /// Construct every provider and service from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the store directory cannot be opened or the
    /// embedding provider rejects its configuration.
    pub fn build(config: AppConfig) -> Result<Self> {
        let store = Arc::new(FsVectorStore::open(&config.vector_store_path)?);
        let embedder: Arc<dyn EmbeddingProvider> = match config.embedding.backend {
            EmbeddingBackend::Hash => {
                Arc::new(HashEmbeddingProvider::new(config.embedding.dimensions)?)
            }
            EmbeddingBackend::Ollama => Arc::new(OllamaEmbeddingProvider::new(
                config.embedding.ollama_url.clone(),
                config.embedding.ollama_model.clone(),
                config.embedding.dimensions,
            )),
        };
        let event_bus = Arc::new(BroadcastEventBus::new());
        let locks = Arc::new(NamespaceLocks::new());
        let events: Arc<dyn EventBusProvider> = event_bus.clone();
        let archiver: Arc<dyn NamespaceArchiver> = store.clone();

        let work_items = Arc::new(WorkItemServiceImpl::new(
            store.clone(),
            embedder.clone(),
            events.clone(),
            locks.clone(),
        ));
        let search = Arc::new(SearchServiceImpl::new(store.clone(), embedder.clone()));
        let memory = Arc::new(MemoryServiceImpl::new(
            store.clone(),
            embedder.clone(),
            locks.clone(),
        ));
        let sync = Arc::new(SyncServiceImpl::new(
            store.clone(),
            embedder.clone(),
            events,
            archiver,
            locks,
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            embedder,
            event_bus,
            work_items,
            search,
            memory,
            sync,
        })
    }
}
