//! Tool registry and dispatch.
//!
//! The surface is a fixed set of nine operations. Each has a typed argument
//! struct whose schema is derived once and served by `tools/list`; dispatch
//! deserializes into that struct up front and hands the typed value to the
//! owning service. Concurrency and deadlines are enforced here: a global
//! semaphore caps in-flight operations and every call runs under the
//! configured timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Semaphore;

use mcw_domain::entities::MemoryKind;
use mcw_domain::error::{Error, Result};
use mcw_domain::ops::{
    ExecuteWorkItemArgs, GetHierarchyArgs, GetWorkItemArgs, ManageWorkItemArgs, MemoryAction,
    MemoryArgs, ReorderWorkItemsArgs, SearchContentArgs, SyncDataArgs, TrackProgressArgs,
};
use mcw_domain::value_objects::Namespace;
use mcw_infrastructure::AppContext;

/// Default result cap for the troubleshoot matcher.
const MATCH_DEFAULT_LIMIT: usize = 5;

/// Headroom between the context-assembly soft deadline and the hard
/// operation timeout, so a slow assembly returns its partial result with
/// `truncated = true` before the timeout can discard it.
const CONTEXT_DEADLINE_MARGIN: Duration = Duration::from_millis(250);

/// One registered tool operation.
pub struct ToolDescriptor {
    /// Tool name on the wire
    pub name: &'static str,
    /// One-line description served by `tools/list`
    pub description: &'static str,
    /// JSON schema of the argument struct
    pub input_schema: Value,
}

fn schema_of<T: schemars::JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| serde_json::json!({}))
}

/// The fixed tool registry, in wire order.
#[must_use]
pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "manage_work_item",
            description: "Create, update, or delete a work item",
            input_schema: schema_of::<ManageWorkItemArgs>(),
        },
        ToolDescriptor {
            name: "get_work_item",
            description: "Fetch one work item by id, title, or keyword",
            input_schema: schema_of::<GetWorkItemArgs>(),
        },
        ToolDescriptor {
            name: "search_content",
            description: "Semantic, keyword, or hybrid search over work items",
            input_schema: schema_of::<SearchContentArgs>(),
        },
        ToolDescriptor {
            name: "get_hierarchy",
            description: "Traverse children, descendants, ancestors, or the full tree",
            input_schema: schema_of::<GetHierarchyArgs>(),
        },
        ToolDescriptor {
            name: "execute_work_item",
            description: "Advisory execution status tracking (nothing is run)",
            input_schema: schema_of::<ExecuteWorkItemArgs>(),
        },
        ToolDescriptor {
            name: "track_progress",
            description: "Record progress on an item or compute namespace analytics",
            input_schema: schema_of::<TrackProgressArgs>(),
        },
        ToolDescriptor {
            name: "reorder_work_items",
            description: "Rewrite the ordering of one sibling group",
            input_schema: schema_of::<ReorderWorkItemsArgs>(),
        },
        ToolDescriptor {
            name: "sync_data",
            description: "Export, import, backup, or restore a namespace",
            input_schema: schema_of::<SyncDataArgs>(),
        },
        ToolDescriptor {
            name: "memory",
            description: "Architecture and troubleshoot memory operations",
            input_schema: schema_of::<MemoryArgs>(),
        },
    ]
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments)
        .map_err(|e| Error::validation(format!("invalid arguments: {e}")))
}

/// Tool dispatcher: typed routing plus concurrency and deadline control.
pub struct Dispatcher {
    ctx: AppContext,
    permits: Arc<Semaphore>,
    deadline: Duration,
}

impl Dispatcher {
    /// Build a dispatcher over the application context.
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        let permits = Arc::new(Semaphore::new(ctx.config.max_concurrent));
        let deadline = Duration::from_secs(ctx.config.request_timeout_secs);
        Self {
            ctx,
            permits,
            deadline,
        }
    }

    /// The application context this dispatcher serves.
    #[must_use]
    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Dispatch one tool call under the deadline and concurrency cap.
    ///
    /// # Errors
    ///
    /// Domain errors pass through; an elapsed deadline becomes
    /// `ErrTimeout`; an unknown tool name is a validation error carrying
    /// the JSON-RPC method-not-found code upstream.
    pub async fn call_tool(
        &self,
        namespace: &Namespace,
        name: &str,
        arguments: Value,
    ) -> Result<Value> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::internal("dispatcher is shutting down"))?;
        tokio::time::timeout(self.deadline, self.route(namespace, name, arguments))
            .await
            .map_err(|_| Error::timeout(format!("'{name}' exceeded the operation deadline")))?
    }

    async fn route(&self, namespace: &Namespace, name: &str, arguments: Value) -> Result<Value> {
        match name {
            "manage_work_item" => {
                let args: ManageWorkItemArgs = parse_args(arguments)?;
                let result = self.ctx.work_items.manage(namespace, args).await?;
                Ok(serde_json::to_value(result)?)
            }
            "get_work_item" => {
                let args: GetWorkItemArgs = parse_args(arguments)?;
                let result = self.ctx.work_items.get(namespace, args).await?;
                Ok(serde_json::to_value(result)?)
            }
            "search_content" => {
                let args: SearchContentArgs = parse_args(arguments)?;
                let result = self.ctx.search.search(namespace, args).await?;
                Ok(serde_json::to_value(result)?)
            }
            "get_hierarchy" => {
                let args: GetHierarchyArgs = parse_args(arguments)?;
                let result = self.ctx.work_items.hierarchy(namespace, args).await?;
                Ok(serde_json::to_value(result)?)
            }
            "execute_work_item" => {
                let args: ExecuteWorkItemArgs = parse_args(arguments)?;
                let result = self.ctx.work_items.execute(namespace, args).await?;
                Ok(serde_json::to_value(result)?)
            }
            "track_progress" => {
                let args: TrackProgressArgs = parse_args(arguments)?;
                let result = self.ctx.work_items.track(namespace, args).await?;
                Ok(serde_json::to_value(result)?)
            }
            "reorder_work_items" => {
                let args: ReorderWorkItemsArgs = parse_args(arguments)?;
                let result = self.ctx.work_items.reorder(namespace, args).await?;
                Ok(serde_json::to_value(result)?)
            }
            "sync_data" => {
                let args: SyncDataArgs = parse_args(arguments)?;
                let result = self.ctx.sync.sync(namespace, args).await?;
                Ok(serde_json::to_value(result)?)
            }
            "memory" => {
                let args: MemoryArgs = parse_args(arguments)?;
                self.route_memory(namespace, args).await
            }
            other => Err(Error::validation(format!("unknown tool '{other}'"))),
        }
    }

    async fn route_memory(&self, namespace: &Namespace, args: MemoryArgs) -> Result<Value> {
        let memory = &self.ctx.memory;
        let kind = args.memory_type;
        match args.action {
            MemoryAction::Create(payload) => {
                Ok(serde_json::to_value(memory.create(namespace, kind, payload).await?)?)
            }
            MemoryAction::Read { slug } => {
                Ok(serde_json::to_value(memory.read(namespace, kind, &slug).await?)?)
            }
            MemoryAction::Update(update) => {
                Ok(serde_json::to_value(memory.update(namespace, kind, update).await?)?)
            }
            MemoryAction::Delete { slug } => {
                let deleted = memory.delete(namespace, kind, &slug).await?;
                Ok(serde_json::json!({ "deleted": deleted }))
            }
            MemoryAction::List { limit } => {
                let items = memory
                    .list(namespace, kind, limit.unwrap_or(mcw_domain::constants::DEFAULT_LIMIT))
                    .await?;
                Ok(serde_json::json!({ "items": items }))
            }
            MemoryAction::Search { query, limit } => {
                let results = memory
                    .search(
                        namespace,
                        kind,
                        &query,
                        limit.unwrap_or(mcw_domain::constants::DEFAULT_LIMIT),
                    )
                    .await?;
                let total_found = results.len();
                Ok(serde_json::json!({ "results": results, "total_found": total_found }))
            }
            MemoryAction::Match { problem, limit } => {
                if kind != MemoryKind::Troubleshoot {
                    return Err(Error::validation("match applies to troubleshoot memory"));
                }
                let matches = memory
                    .match_problem(namespace, &problem, limit.unwrap_or(MATCH_DEFAULT_LIMIT))
                    .await?;
                Ok(serde_json::json!({ "matches": matches }))
            }
            MemoryAction::RecordUse { slug, outcome } => {
                if kind != MemoryKind::Troubleshoot {
                    return Err(Error::validation("record_use applies to troubleshoot memory"));
                }
                Ok(serde_json::to_value(memory.record_use(namespace, &slug, outcome).await?)?)
            }
            MemoryAction::GetContext {
                slug,
                token_budget,
                depth,
            } => {
                if kind != MemoryKind::Architecture {
                    return Err(Error::validation("get_context applies to architecture memory"));
                }
                // Soft deadline inside the hard operation timeout: assembly
                // stops there and reports `truncated = true` instead of
                // losing the partial result to `ErrTimeout`.
                let deadline =
                    Instant::now() + self.deadline.saturating_sub(CONTEXT_DEADLINE_MARGIN);
                let context = memory
                    .get_context(
                        namespace,
                        &slug,
                        token_budget.unwrap_or(0),
                        depth.unwrap_or(0),
                        Some(deadline),
                    )
                    .await?;
                Ok(serde_json::to_value(context)?)
            }
            MemoryAction::Export { slugs } => {
                let documents = memory.export(namespace, kind, slugs).await?;
                Ok(serde_json::json!({ "documents": documents }))
            }
            MemoryAction::Import { documents, mode } => {
                Ok(serde_json::to_value(memory.import(namespace, kind, documents, mode).await?)?)
            }
        }
    }
}
