//! Shared fixtures: real store and embedder, recording event bus.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use mcw_application::locks::NamespaceLocks;
use mcw_application::{MemoryServiceImpl, SearchServiceImpl, SyncServiceImpl, WorkItemServiceImpl};
use mcw_domain::entities::{WorkItem, WorkItemStatus, WorkItemType};
use mcw_domain::error::Result;
use mcw_domain::events::DomainEvent;
use mcw_domain::ops::{CreateWorkItem, ManageWorkItemArgs, ManageWorkItemResult};
use mcw_domain::ports::event_bus::DomainEventStream;
use mcw_domain::ports::{EventBusProvider, WorkItemServiceInterface};
use mcw_domain::value_objects::{Namespace, WorkItemId};
use mcw_providers::embedding::HashEmbeddingProvider;
use mcw_providers::vector_store::FsVectorStore;

/// Event bus double that records every published event.
#[derive(Default)]
pub struct RecordingEventBus {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventBus {
    pub fn published(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("bus mutex").clone()
    }
}

#[async_trait]
impl EventBusProvider for RecordingEventBus {
    async fn publish_event(&self, event: DomainEvent) -> Result<()> {
        self.events.lock().expect("bus mutex").push(event);
        Ok(())
    }

    async fn subscribe_events(&self) -> Result<DomainEventStream> {
        Ok(Box::pin(stream::empty()))
    }

    fn has_subscribers(&self) -> bool {
        false
    }
}

/// Everything a test needs, kept alive together with the temp dir.
pub struct Fixture {
    pub work_items: WorkItemServiceImpl,
    pub search: SearchServiceImpl,
    pub memory: MemoryServiceImpl,
    pub sync: SyncServiceImpl,
    pub bus: Arc<RecordingEventBus>,
    _dir: tempfile::TempDir,
}

pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FsVectorStore::open(dir.path()).expect("store"));
    let embedder = Arc::new(HashEmbeddingProvider::new(64).expect("embedder"));
    let bus = Arc::new(RecordingEventBus::default());
    let locks = Arc::new(NamespaceLocks::new());

    Fixture {
        work_items: WorkItemServiceImpl::new(
            store.clone(),
            embedder.clone(),
            bus.clone(),
            locks.clone(),
        ),
        search: SearchServiceImpl::new(store.clone(), embedder.clone()),
        memory: MemoryServiceImpl::new(store.clone(), embedder.clone(), locks.clone()),
        sync: SyncServiceImpl::new(store.clone(), embedder, bus.clone(), store, locks),
        bus,
        _dir: dir,
    }
}

pub fn ns(name: &str) -> Namespace {
    Namespace::parse(name).expect("namespace")
}

pub fn create_args(item_type: WorkItemType, title: &str, parent: Option<WorkItemId>) -> CreateWorkItem {
    CreateWorkItem {
        item_type,
        title: title.to_owned(),
        description: format!("{title} description"),
        status: None,
        priority: None,
        complexity: None,
        parent_id: parent,
        acceptance_criteria: vec![],
        context_tags: vec![],
        notes: String::new(),
    }
}

pub async fn create(
    service: &WorkItemServiceImpl,
    namespace: &Namespace,
    item_type: WorkItemType,
    title: &str,
    parent: Option<WorkItemId>,
) -> WorkItem {
    match service
        .manage(
            namespace,
            ManageWorkItemArgs::Create(create_args(item_type, title, parent)),
        )
        .await
        .expect("create")
    {
        ManageWorkItemResult::Item(item) => *item,
        ManageWorkItemResult::Deleted { .. } => panic!("create returned delete result"),
    }
}

pub async fn set_status(
    service: &WorkItemServiceImpl,
    namespace: &Namespace,
    id: WorkItemId,
    status: WorkItemStatus,
) -> WorkItem {
    let args = mcw_domain::ops::UpdateWorkItem {
        work_item_id: id,
        title: None,
        description: None,
        status: Some(status),
        priority: None,
        complexity: None,
        parent_id: None,
        acceptance_criteria: None,
        context_tags: None,
        notes: None,
    };
    match service
        .manage(namespace, ManageWorkItemArgs::Update(args))
        .await
        .expect("update status")
    {
        ManageWorkItemResult::Item(item) => *item,
        ManageWorkItemResult::Deleted { .. } => panic!("update returned delete result"),
    }
}

pub async fn fetch(
    service: &WorkItemServiceImpl,
    namespace: &Namespace,
    id: WorkItemId,
) -> serde_json::Value {
    service
        .get(
            namespace,
            mcw_domain::ops::GetWorkItemArgs {
                work_item_id: Some(id.as_str()),
                slug_or_keyword: None,
                include_children: false,
                format: mcw_domain::ops::ItemFormat::Detailed,
            },
        )
        .await
        .expect("get")
        .item
}
