//! Work-item search.

use std::sync::Arc;

use async_trait::async_trait;

use mcw_domain::entities::WorkItem;
use mcw_domain::error::Result;
use mcw_domain::ops::{SearchContentArgs, SearchFilters, SearchHit, SearchResults, SearchType};
use mcw_domain::ports::{
    EmbeddingProvider, OrderBy, ScoredRecord, SearchServiceInterface, TableKind, TableRef,
    VectorStore,
};
use mcw_domain::value_objects::Namespace;

use crate::format::shape_item;
use crate::records::record_to_work_item;
use crate::use_cases::clamp_limit;

/// Search implementation over the vector store.
pub struct SearchServiceImpl {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SearchServiceImpl {
    /// Wire the service to its collaborators.
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    fn table(namespace: &Namespace) -> TableRef {
        TableRef::new(namespace.clone(), TableKind::WorkItems)
    }

    /// Translate declarative filters into a scan predicate over the stored
    /// fields. Enum values compare through their serde string forms.
    fn filter_predicate(
        filters: &SearchFilters,
    ) -> impl Fn(&serde_json::Value) -> bool + Send + Sync + use<> {
        let item_type = filters
            .item_type
            .map(|t| serde_json::to_value(t).unwrap_or_default());
        let status = filters
            .status
            .map(|s| serde_json::to_value(s).unwrap_or_default());
        let priority = filters
            .priority
            .map(|p| serde_json::to_value(p).unwrap_or_default());
        let parent_id = filters
            .parent_id
            .map(|p| serde_json::to_value(p).unwrap_or_default());
        let tags = filters.context_tags.clone();

        move |fields: &serde_json::Value| {
            if let Some(wanted) = &item_type {
                if fields.get("type") != Some(wanted) {
                    return false;
                }
            }
            if let Some(wanted) = &status {
                if fields.get("status") != Some(wanted) {
                    return false;
                }
            }
            if let Some(wanted) = &priority {
                if fields.get("priority") != Some(wanted) {
                    return false;
                }
            }
            if let Some(wanted) = &parent_id {
                if fields.get("parent_id") != Some(wanted) {
                    return false;
                }
            }
            if !tags.is_empty() {
                let Some(item_tags) = fields.get("context_tags").and_then(|t| t.as_array()) else {
                    return false;
                };
                for tag in &tags {
                    if !item_tags.iter().any(|t| t.as_str() == Some(tag)) {
                        return false;
                    }
                }
            }
            true
        }
    }

    fn shape_hits(hits: Vec<(WorkItem, f32)>, args: &SearchContentArgs) -> Vec<SearchHit> {
        // Search results stand alone, so child counts are not loaded.
        hits.into_iter()
            .map(|(item, score)| SearchHit {
                item: shape_item(&item, args.format, 0),
                score,
            })
            .collect()
    }

    fn to_items(records: Vec<ScoredRecord>) -> Result<Vec<(WorkItem, f32)>> {
        records
            .into_iter()
            .map(|hit| Ok((record_to_work_item(&hit.record)?, hit.score)))
            .collect()
    }
}

#[async_trait]
impl SearchServiceInterface for SearchServiceImpl {
    async fn search(&self, namespace: &Namespace, args: SearchContentArgs) -> Result<SearchResults> {
        let limit = clamp_limit(args.limit);
        let table = Self::table(namespace);
        let filters = args.filters.clone().unwrap_or_default();
        let predicate = Self::filter_predicate(&filters);
        let query = args.query.trim();

        // An empty hybrid query means "list": newest first, no ranking.
        if query.is_empty() && args.search_type == SearchType::Hybrid {
            let total = self.store.count(&table, Some(&predicate)).await?;
            let records = self
                .store
                .scan(
                    &table,
                    Some(&predicate),
                    Some(OrderBy::desc("updated_at")),
                    limit,
                )
                .await?;
            let items: Vec<(WorkItem, f32)> = records
                .iter()
                .map(|record| Ok((record_to_work_item(record)?, 0.0)))
                .collect::<Result<_>>()?;
            return Ok(SearchResults {
                results: Self::shape_hits(items, &args),
                total_found: total,
            });
        }

        let hits = match args.search_type {
            SearchType::Semantic => {
                let embedding = self.embedder.embed(query).await?;
                self.store
                    .vector_topk(&table, &embedding.vector, limit, Some(&predicate))
                    .await?
            }
            SearchType::Keyword => {
                self.store
                    .keyword_topk(&table, query, limit, Some(&predicate))
                    .await?
            }
            SearchType::Hybrid => {
                let embedding = self.embedder.embed(query).await?;
                self.store
                    .hybrid_topk(
                        &table,
                        Some(&embedding.vector),
                        query,
                        limit,
                        Some(&predicate),
                    )
                    .await?
            }
        };

        let items = Self::to_items(hits)?;
        let total_found = items.len();
        Ok(SearchResults {
            results: Self::shape_hits(items, &args),
            total_found,
        })
    }
}
