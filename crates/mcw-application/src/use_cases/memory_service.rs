//! Memory store CRUD and retrieval.
//!
//! Architecture and troubleshoot items are stored per namespace with their
//! search text embedded for hybrid retrieval. Mutations serialize on the
//! shared per-namespace locks; embeddings are computed before the lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;

use mcw_domain::constants::{
    CHILDREN_SLUGS_MAX, DEFAULT_CONTEXT_DEPTH, DEFAULT_TOKEN_BUDGET, KEYWORDS_MAX,
    LINKED_EPICS_MAX, MARKDOWN_MAX_CHARS, MATCH_CANDIDATES, RELATED_SLUGS_MAX, SLUG_MAX_CHARS,
    USE_CASE_MAX,
};
use mcw_domain::entities::{ArchitectureItem, MemoryKind, TroubleshootItem};
use mcw_domain::error::{Error, Result};
use mcw_domain::ops::{
    ExportedDocument, ImportMode, ImportReport, MatchCandidate, MemoryPayload, MemoryReadResult,
    MemoryUpdate, RecordError, SmartContext, UseOutcome,
};
use mcw_domain::ports::{
    EmbeddingProvider, MemoryServiceInterface, OrderBy, StoredRecord, TableKind, TableRef,
    VectorStore, WriteOp,
};
use mcw_domain::value_objects::{Embedding, MemoryId, Namespace};

use crate::locks::NamespaceLocks;
use crate::markdown;
use crate::records::{
    architecture_to_record, record_to_architecture, record_to_troubleshoot, troubleshoot_to_record,
};
use crate::use_cases::clamp_limit;
use crate::use_cases::context_service;

/// Memory store implementation over the vector store.
pub struct MemoryServiceImpl {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    locks: Arc<NamespaceLocks>,
}

impl MemoryServiceImpl {
    /// Wire the service to its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        locks: Arc<NamespaceLocks>,
    ) -> Self {
        Self {
            store,
            embedder,
            locks,
        }
    }

    fn table(namespace: &Namespace, kind: MemoryKind) -> TableRef {
        let table_kind = match kind {
            MemoryKind::Architecture => TableKind::Architecture,
            MemoryKind::Troubleshoot => TableKind::Troubleshoot,
        };
        TableRef::new(namespace.clone(), table_kind)
    }

    fn validate_slug(slug: &str) -> Result<()> {
        if slug.is_empty() || slug.chars().count() > SLUG_MAX_CHARS {
            return Err(Error::validation(format!(
                "slug must be 1-{SLUG_MAX_CHARS} characters"
            )));
        }
        Ok(())
    }

    fn validate_lists(
        use_cases: usize,
        keywords: usize,
        children: usize,
        related: usize,
        epics: usize,
        body_chars: usize,
    ) -> Result<()> {
        if use_cases > USE_CASE_MAX {
            return Err(Error::validation(format!(
                "at most {USE_CASE_MAX} use-case entries allowed"
            )));
        }
        if keywords > KEYWORDS_MAX {
            return Err(Error::validation(format!(
                "at most {KEYWORDS_MAX} keywords allowed"
            )));
        }
        if children > CHILDREN_SLUGS_MAX {
            return Err(Error::validation(format!(
                "at most {CHILDREN_SLUGS_MAX} child links allowed"
            )));
        }
        if related > RELATED_SLUGS_MAX {
            return Err(Error::validation(format!(
                "at most {RELATED_SLUGS_MAX} related links allowed"
            )));
        }
        if epics > LINKED_EPICS_MAX {
            return Err(Error::validation(format!(
                "at most {LINKED_EPICS_MAX} linked epics allowed"
            )));
        }
        if body_chars > MARKDOWN_MAX_CHARS {
            return Err(Error::validation(format!(
                "markdown body exceeds {MARKDOWN_MAX_CHARS} characters"
            )));
        }
        Ok(())
    }

    async fn load_architecture(
        &self,
        namespace: &Namespace,
    ) -> Result<HashMap<String, ArchitectureItem>> {
        let records = self
            .store
            .scan(
                &Self::table(namespace, MemoryKind::Architecture),
                None,
                None,
                usize::MAX,
            )
            .await?;
        let mut map = HashMap::with_capacity(records.len());
        for record in &records {
            let item = record_to_architecture(record)?;
            map.insert(item.slug.clone(), item);
        }
        Ok(map)
    }

    /// Reject a `children_slugs` graph containing a cycle among known
    /// slugs. Dangling references cannot close a cycle, so they pass.
    fn check_acyclic(graph: &HashMap<String, Vec<String>>) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        fn visit(
            node: &str,
            graph: &HashMap<String, Vec<String>>,
            marks: &mut HashMap<String, Mark>,
        ) -> Result<()> {
            match marks.get(node) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(Error::cycle(format!(
                        "children_slugs cycle through '{node}'"
                    )));
                }
                None => {}
            }
            marks.insert(node.to_owned(), Mark::Visiting);
            if let Some(children) = graph.get(node) {
                for child in children {
                    if graph.contains_key(child.as_str()) {
                        visit(child, graph, marks)?;
                    }
                }
            }
            marks.insert(node.to_owned(), Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for node in graph.keys() {
            visit(node, graph, &mut marks)?;
        }
        Ok(())
    }

    fn architecture_graph(
        items: &HashMap<String, ArchitectureItem>,
        replacing: &ArchitectureItem,
    ) -> HashMap<String, Vec<String>> {
        let mut graph: HashMap<String, Vec<String>> = items
            .iter()
            .map(|(slug, item)| (slug.clone(), item.children_slugs.clone()))
            .collect();
        graph.insert(replacing.slug.clone(), replacing.children_slugs.clone());
        graph
    }

    fn dangling_links(
        item: &ArchitectureItem,
        known: &HashSet<String>,
    ) -> Vec<String> {
        item.children_slugs
            .iter()
            .chain(item.related_slugs.iter())
            .filter(|slug| !known.contains(*slug))
            .cloned()
            .collect()
    }

    async fn read_result(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        record: &StoredRecord,
    ) -> Result<MemoryReadResult> {
        let dangling = match kind {
            MemoryKind::Architecture => {
                let item = record_to_architecture(record)?;
                let known: HashSet<String> =
                    self.load_architecture(namespace).await?.into_keys().collect();
                Self::dangling_links(&item, &known)
            }
            MemoryKind::Troubleshoot => Vec::new(),
        };
        Ok(MemoryReadResult {
            item: record.fields.clone(),
            dangling,
        })
    }

    async fn embed_text(&self, text: &str) -> Result<Option<Vec<f32>>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(self.embedder.embed(text).await?.vector))
    }

    fn build_architecture(
        namespace: &Namespace,
        payload: MemoryPayload,
    ) -> Result<ArchitectureItem> {
        if payload.ai_solutions.is_some() || payload.ai_use_case.is_some() {
            return Err(Error::validation(
                "ai_solutions/ai_use_case are troubleshoot fields",
            ));
        }
        let now = Utc::now();
        let item = ArchitectureItem {
            id: MemoryId::new(),
            namespace: namespace.clone(),
            slug: payload.slug,
            title: payload.title,
            ai_requirements: payload.ai_requirements.unwrap_or_default(),
            ai_when_to_use: payload.ai_when_to_use.unwrap_or_default(),
            keywords: payload.keywords.unwrap_or_default(),
            children_slugs: payload.children_slugs.unwrap_or_default(),
            related_slugs: payload.related_slugs.unwrap_or_default(),
            linked_epic_ids: payload.linked_epic_ids.unwrap_or_default(),
            tags: payload.tags.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        Self::validate_slug(&item.slug)?;
        if item.title.is_empty() {
            return Err(Error::validation("title must not be empty"));
        }
        Self::validate_lists(
            item.ai_when_to_use.len(),
            item.keywords.len(),
            item.children_slugs.len(),
            item.related_slugs.len(),
            item.linked_epic_ids.len(),
            item.ai_requirements.chars().count(),
        )?;
        Ok(item)
    }

    fn build_troubleshoot(
        namespace: &Namespace,
        payload: MemoryPayload,
    ) -> Result<TroubleshootItem> {
        if payload.ai_requirements.is_some()
            || payload.children_slugs.is_some()
            || payload.related_slugs.is_some()
            || payload.ai_when_to_use.is_some()
            || payload.linked_epic_ids.is_some()
        {
            return Err(Error::validation(
                "architecture fields are not valid on troubleshoot items",
            ));
        }
        let now = Utc::now();
        let item = TroubleshootItem {
            id: MemoryId::new(),
            namespace: namespace.clone(),
            slug: payload.slug,
            title: payload.title,
            ai_solutions: payload.ai_solutions.unwrap_or_default(),
            ai_use_case: payload.ai_use_case.unwrap_or_default(),
            keywords: payload.keywords.unwrap_or_default(),
            tags: payload.tags.unwrap_or_default(),
            usage_count: 0,
            success_count: 0,
            created_at: now,
            updated_at: now,
        };
        Self::validate_slug(&item.slug)?;
        if item.title.is_empty() {
            return Err(Error::validation("title must not be empty"));
        }
        Self::validate_lists(
            item.ai_use_case.len(),
            item.keywords.len(),
            0,
            0,
            0,
            item.ai_solutions.chars().count(),
        )?;
        Ok(item)
    }
}

#[async_trait]
impl MemoryServiceInterface for MemoryServiceImpl {
    async fn create(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        payload: MemoryPayload,
    ) -> Result<MemoryReadResult> {
        let table = Self::table(namespace, kind);
        let (record, vector_text) = match kind {
            MemoryKind::Architecture => {
                let item = Self::build_architecture(namespace, payload)?;
                let graph = Self::architecture_graph(
                    &self.load_architecture(namespace).await?,
                    &item,
                );
                Self::check_acyclic(&graph)?;
                let text = item.search_text();
                (architecture_to_record(&item, None)?, text)
            }
            MemoryKind::Troubleshoot => {
                let item = Self::build_troubleshoot(namespace, payload)?;
                let text = item.search_text();
                (troubleshoot_to_record(&item, None)?, text)
            }
        };
        let vector = self.embed_text(&vector_text).await?;

        let _guard = self.locks.acquire(namespace).await;
        if self.store.get(&table, &record.id).await?.is_some() {
            return Err(Error::validation(format!(
                "slug '{}' already exists",
                record.id
            )));
        }
        let record = StoredRecord { vector, ..record };
        self.store.upsert(&table, record.clone()).await?;
        drop(_guard);

        self.read_result(namespace, kind, &record).await
    }

    async fn read(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        slug: &str,
    ) -> Result<MemoryReadResult> {
        let record = self
            .store
            .get(&Self::table(namespace, kind), slug)
            .await?
            .ok_or_else(|| Error::not_found(format!("{kind} item '{slug}'")))?;
        self.read_result(namespace, kind, &record).await
    }

    async fn update(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        update: MemoryUpdate,
    ) -> Result<MemoryReadResult> {
        let table = Self::table(namespace, kind);
        let current = self
            .store
            .get(&table, &update.slug)
            .await?
            .ok_or_else(|| Error::not_found(format!("{kind} item '{}'", update.slug)))?;
        let now = Utc::now();

        let (record, text) = match kind {
            MemoryKind::Architecture => {
                if update.ai_solutions.is_some() || update.ai_use_case.is_some() {
                    return Err(Error::validation(
                        "ai_solutions/ai_use_case are troubleshoot fields",
                    ));
                }
                let mut item = record_to_architecture(&current)?;
                if let Some(title) = update.title {
                    item.title = title;
                }
                if let Some(requirements) = update.ai_requirements {
                    item.ai_requirements = requirements;
                }
                if let Some(when) = update.ai_when_to_use {
                    item.ai_when_to_use = when;
                }
                if let Some(children) = update.children_slugs {
                    item.children_slugs = children;
                }
                if let Some(related) = update.related_slugs {
                    item.related_slugs = related;
                }
                if let Some(epics) = update.linked_epic_ids {
                    item.linked_epic_ids = epics;
                }
                if let Some(keywords) = update.keywords {
                    item.keywords = keywords;
                }
                if let Some(tags) = update.tags {
                    item.tags = tags;
                }
                item.updated_at = now;
                Self::validate_lists(
                    item.ai_when_to_use.len(),
                    item.keywords.len(),
                    item.children_slugs.len(),
                    item.related_slugs.len(),
                    item.linked_epic_ids.len(),
                    item.ai_requirements.chars().count(),
                )?;
                let graph = Self::architecture_graph(
                    &self.load_architecture(namespace).await?,
                    &item,
                );
                Self::check_acyclic(&graph)?;
                let text = item.search_text();
                (architecture_to_record(&item, None)?, text)
            }
            MemoryKind::Troubleshoot => {
                if update.ai_requirements.is_some()
                    || update.children_slugs.is_some()
                    || update.related_slugs.is_some()
                    || update.ai_when_to_use.is_some()
                    || update.linked_epic_ids.is_some()
                {
                    return Err(Error::validation(
                        "architecture fields are not valid on troubleshoot items",
                    ));
                }
                let mut item = record_to_troubleshoot(&current)?;
                if let Some(title) = update.title {
                    item.title = title;
                }
                if let Some(solutions) = update.ai_solutions {
                    item.ai_solutions = solutions;
                }
                if let Some(use_cases) = update.ai_use_case {
                    item.ai_use_case = use_cases;
                }
                if let Some(keywords) = update.keywords {
                    item.keywords = keywords;
                }
                if let Some(tags) = update.tags {
                    item.tags = tags;
                }
                item.updated_at = now;
                Self::validate_lists(
                    item.ai_use_case.len(),
                    item.keywords.len(),
                    0,
                    0,
                    0,
                    item.ai_solutions.chars().count(),
                )?;
                let text = item.search_text();
                (troubleshoot_to_record(&item, None)?, text)
            }
        };
        let vector = self.embed_text(&text).await?;

        let _guard = self.locks.acquire(namespace).await;
        let record = StoredRecord { vector, ..record };
        self.store.upsert(&table, record.clone()).await?;
        drop(_guard);

        self.read_result(namespace, kind, &record).await
    }

    async fn delete(&self, namespace: &Namespace, kind: MemoryKind, slug: &str) -> Result<bool> {
        let _guard = self.locks.acquire(namespace).await;
        self.store.delete(&Self::table(namespace, kind), slug).await
    }

    async fn list(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        limit: usize,
    ) -> Result<Vec<serde_json::Value>> {
        let records = self
            .store
            .scan(
                &Self::table(namespace, kind),
                None,
                Some(OrderBy::desc("updated_at")),
                clamp_limit(Some(limit)),
            )
            .await?;
        Ok(records.into_iter().map(|record| record.fields).collect())
    }

    async fn search(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<serde_json::Value>> {
        let vector = self.embed_text(query).await?;
        let hits = self
            .store
            .hybrid_topk(
                &Self::table(namespace, kind),
                vector.as_deref(),
                query,
                clamp_limit(Some(limit)),
                None,
            )
            .await?;
        Ok(hits
            .into_iter()
            .map(|hit| {
                serde_json::json!({
                    "item": hit.record.fields,
                    "score": hit.score,
                })
            })
            .collect())
    }

    async fn match_problem(
        &self,
        namespace: &Namespace,
        problem: &str,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>> {
        if problem.trim().is_empty() {
            return Err(Error::validation("match requires a problem description"));
        }
        let query = self.embedder.embed(problem).await?;
        let hits = self
            .store
            .hybrid_topk(
                &Self::table(namespace, MemoryKind::Troubleshoot),
                Some(&query.vector),
                problem,
                MATCH_CANDIDATES,
                None,
            )
            .await?;
        let candidates = hits
            .into_iter()
            .map(|hit| {
                let item = record_to_troubleshoot(&hit.record)?;
                let similarity = hit
                    .record
                    .vector
                    .as_ref()
                    .map(|v| f64::from(Embedding::cosine_similarity(&query.vector, v)))
                    .unwrap_or(0.0);
                Ok((item, similarity))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(context_service::rank_candidates(candidates, limit))
    }

    async fn record_use(
        &self,
        namespace: &Namespace,
        slug: &str,
        outcome: UseOutcome,
    ) -> Result<MemoryReadResult> {
        let table = Self::table(namespace, MemoryKind::Troubleshoot);
        let _guard = self.locks.acquire(namespace).await;
        let record = self
            .store
            .get(&table, slug)
            .await?
            .ok_or_else(|| Error::not_found(format!("troubleshoot item '{slug}'")))?;
        let mut item = record_to_troubleshoot(&record)?;
        item.usage_count += 1;
        if outcome == UseOutcome::Success {
            item.success_count += 1;
        }
        item.updated_at = Utc::now();
        let updated = troubleshoot_to_record(&item, record.vector.clone())?;
        self.store.upsert(&table, updated.clone()).await?;
        drop(_guard);
        Ok(MemoryReadResult {
            item: updated.fields,
            dangling: Vec::new(),
        })
    }

    async fn get_context(
        &self,
        namespace: &Namespace,
        slug: &str,
        token_budget: usize,
        depth: usize,
        deadline: Option<Instant>,
    ) -> Result<SmartContext> {
        let budget = if token_budget == 0 {
            DEFAULT_TOKEN_BUDGET
        } else {
            token_budget
        };
        let depth = if depth == 0 { DEFAULT_CONTEXT_DEPTH } else { depth };
        let items = self.load_architecture(namespace).await?;
        context_service::assemble_context(&items, slug, budget, depth, deadline)
    }

    async fn export(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        slugs: Option<Vec<String>>,
    ) -> Result<Vec<ExportedDocument>> {
        let records = self
            .store
            .scan(&Self::table(namespace, kind), None, None, usize::MAX)
            .await?;
        let wanted: Option<HashSet<String>> = slugs.map(|list| list.into_iter().collect());
        let mut documents = Vec::new();
        for record in &records {
            if let Some(wanted) = &wanted {
                if !wanted.contains(&record.id) {
                    continue;
                }
            }
            let doc = match kind {
                MemoryKind::Architecture => {
                    markdown::render_architecture(&record_to_architecture(record)?)
                }
                MemoryKind::Troubleshoot => {
                    markdown::render_troubleshoot(&record_to_troubleshoot(record)?)
                }
            };
            documents.push(ExportedDocument {
                name: format!("{}.md", record.id),
                content: doc.render(),
            });
        }
        Ok(documents)
    }

    async fn import(
        &self,
        namespace: &Namespace,
        kind: MemoryKind,
        documents: Vec<String>,
        mode: ImportMode,
    ) -> Result<ImportReport> {
        let table = Self::table(namespace, kind);
        let mut report = ImportReport::default();
        let mut staged: Vec<StoredRecord> = Vec::new();
        let mut staged_slugs: HashSet<String> = HashSet::new();

        for (index, text) in documents.iter().enumerate() {
            let outcome = async {
                let doc = markdown::Document::parse(text)?;
                let (record, search_text) = match kind {
                    MemoryKind::Architecture => {
                        let item = markdown::architecture_from_document(&doc, namespace)?;
                        let text = item.search_text();
                        (architecture_to_record(&item, None)?, text)
                    }
                    MemoryKind::Troubleshoot => {
                        let item = markdown::troubleshoot_from_document(&doc, namespace)?;
                        let text = item.search_text();
                        (troubleshoot_to_record(&item, None)?, text)
                    }
                };
                let exists = self.store.get(&table, &record.id).await?.is_some();
                match mode {
                    ImportMode::CreateOnly if exists => {
                        return Err(Error::validation(format!(
                            "slug '{}' already exists",
                            record.id
                        )));
                    }
                    ImportMode::UpdateOnly if !exists => {
                        return Err(Error::not_found(format!("slug '{}'", record.id)));
                    }
                    _ => {}
                }
                let vector = self.embed_text(&search_text).await?;
                Ok((StoredRecord { vector, ..record }, exists))
            }
            .await;

            match outcome {
                Ok((record, exists)) => {
                    if exists {
                        report.updated += 1;
                    } else {
                        report.created += 1;
                    }
                    staged_slugs.insert(record.id.clone());
                    staged.push(record);
                }
                Err(error) => report.errors.push(RecordError {
                    index,
                    id: None,
                    code: error.code().to_owned(),
                    message: error.to_string(),
                }),
            }
        }

        let _guard = self.locks.acquire(namespace).await;
        let mut ops: Vec<WriteOp> = staged.into_iter().map(WriteOp::Put).collect();
        if mode == ImportMode::Replace {
            let existing = self.store.scan(&table, None, None, usize::MAX).await?;
            for record in existing {
                if !staged_slugs.contains(&record.id) {
                    report.deleted += 1;
                    ops.push(WriteOp::Delete(record.id));
                }
            }
        }
        if !ops.is_empty() {
            self.store.apply(&table, ops).await?;
        }
        Ok(report)
    }
}
