//! Markdown document rendering and parsing.
//!
//! Every exported item is one document: a header block of `key: <JSON
//! value>` lines between `---` markers, a blank line, then the item's
//! primary markdown field as the body. Rendering is canonical (fixed key
//! order, JSON-encoded values), so export → import → export is byte-exact.

use chrono::{DateTime, Utc};
use serde_json::Value;

use mcw_domain::entities::{ArchitectureItem, MemoryKind, TroubleshootItem, WorkItem};
use mcw_domain::error::{Error, Result};
use mcw_domain::value_objects::{MemoryId, Namespace, WorkItemId};

const DIVIDER: &str = "---";

/// A parsed document: ordered header pairs plus the body.
#[derive(Debug, Clone)]
pub struct Document {
    /// Header pairs in document order
    pub header: Vec<(String, Value)>,
    /// Markdown body
    pub body: String,
}

impl Document {
    /// Look up one header value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.header
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    fn get_str(&self, key: &str) -> Result<String> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| Error::validation(format!("document header missing '{key}'")))
    }

    /// Render back to canonical text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from(DIVIDER);
        out.push('\n');
        for (key, value) in &self.header {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&value.to_string());
            out.push('\n');
        }
        out.push_str(DIVIDER);
        out.push('\n');
        out.push('\n');
        out.push_str(&self.body);
        out
    }

    /// Parse a document from text.
    ///
    /// # Errors
    ///
    /// Returns `ErrValidation` when the header block is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        if lines.next() != Some(DIVIDER) {
            return Err(Error::validation("document must start with '---'"));
        }
        let mut header = Vec::new();
        let mut consumed = DIVIDER.len() + 1;
        let mut closed = false;
        for line in lines {
            consumed += line.len() + 1;
            if line == DIVIDER {
                closed = true;
                break;
            }
            let (key, raw) = line.split_once(": ").ok_or_else(|| {
                Error::validation(format!("malformed header line '{line}'"))
            })?;
            let value: Value = serde_json::from_str(raw).map_err(|e| {
                Error::validation(format!("header value for '{key}' is not valid JSON: {e}"))
            })?;
            header.push((key.to_owned(), value));
        }
        if !closed {
            return Err(Error::validation("document header is not terminated"));
        }
        let rest = text.get(consumed..).unwrap_or("");
        let body = rest.strip_prefix('\n').unwrap_or(rest).to_owned();
        Ok(Self { header, body })
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn parse_timestamp(doc: &Document, key: &str) -> Result<DateTime<Utc>> {
    let raw = doc.get_str(key)?;
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| Error::validation(format!("invalid timestamp in '{key}': {e}")))
}

fn string_list(doc: &Document, key: &str) -> Vec<String> {
    doc.get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

// --- Work items ------------------------------------------------------------

/// Render one work item as a document. `sequence_number` and `progress`
/// are emitted for human readers but ignored on import.
#[must_use]
pub fn render_work_item(item: &WorkItem) -> Document {
    let header = vec![
        ("id".to_owned(), to_value(&item.id)),
        ("type".to_owned(), Value::from("work_item")),
        ("namespace".to_owned(), to_value(&item.namespace)),
        ("item_type".to_owned(), to_value(&item.item_type)),
        ("title".to_owned(), Value::from(item.title.clone())),
        ("status".to_owned(), to_value(&item.status)),
        ("priority".to_owned(), to_value(&item.priority)),
        ("complexity".to_owned(), to_value(&item.complexity)),
        ("parent_id".to_owned(), to_value(&item.parent_id)),
        ("order_index".to_owned(), Value::from(item.order_index)),
        ("sequence_number".to_owned(), to_value(&item.sequence_number)),
        ("progress".to_owned(), Value::from(item.progress)),
        (
            "acceptance_criteria".to_owned(),
            to_value(&item.acceptance_criteria),
        ),
        ("context_tags".to_owned(), to_value(&item.context_tags)),
        ("notes".to_owned(), Value::from(item.notes.clone())),
        ("status_override".to_owned(), Value::from(item.status_override)),
        ("created_at".to_owned(), to_value(&item.created_at)),
        ("updated_at".to_owned(), to_value(&item.updated_at)),
    ];
    Document {
        header,
        body: item.description.clone(),
    }
}

/// Rebuild a work item from a parsed document. The target namespace
/// replaces whatever the header carried; derived fields are recomputed
/// downstream, never trusted.
///
/// # Errors
///
/// Returns `ErrValidation` when required header fields are missing or
/// malformed.
pub fn work_item_from_document(doc: &Document, namespace: &Namespace) -> Result<WorkItem> {
    if doc.get_str("type")? != "work_item" {
        return Err(Error::validation("document is not a work_item"));
    }
    let id: WorkItemId = doc
        .get("id")
        .cloned()
        .ok_or_else(|| Error::validation("document header missing 'id'"))
        .and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| Error::validation(format!("invalid work item id: {e}")))
        })?;
    let status = serde_json::from_value(
        doc.get("status").cloned().unwrap_or(Value::Null),
    )
    .map_err(|e| Error::validation(format!("invalid status: {e}")))?;

    Ok(WorkItem {
        id,
        namespace: namespace.clone(),
        item_type: serde_json::from_value(
            doc.get("item_type").cloned().unwrap_or(Value::Null),
        )
        .map_err(|e| Error::validation(format!("invalid item_type: {e}")))?,
        title: doc.get_str("title")?,
        description: doc.body.clone(),
        status,
        priority: serde_json::from_value(doc.get("priority").cloned().unwrap_or(Value::Null))
            .map_err(|e| Error::validation(format!("invalid priority: {e}")))?,
        complexity: doc
            .get("complexity")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok()),
        parent_id: doc
            .get("parent_id")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok()),
        order_index: doc
            .get("order_index")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize,
        sequence_number: None,
        progress: 0.0,
        acceptance_criteria: string_list(doc, "acceptance_criteria"),
        context_tags: string_list(doc, "context_tags"),
        notes: doc.get_str("notes").unwrap_or_default(),
        status_override: doc
            .get("status_override")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        created_at: parse_timestamp(doc, "created_at")?,
        updated_at: parse_timestamp(doc, "updated_at")?,
    })
}

// --- Memory items ----------------------------------------------------------

/// Render one architecture item as a document.
#[must_use]
pub fn render_architecture(item: &ArchitectureItem) -> Document {
    let header = vec![
        ("slug".to_owned(), Value::from(item.slug.clone())),
        ("type".to_owned(), Value::from("architecture")),
        ("namespace".to_owned(), to_value(&item.namespace)),
        ("id".to_owned(), to_value(&item.id)),
        ("title".to_owned(), Value::from(item.title.clone())),
        ("ai_when_to_use".to_owned(), to_value(&item.ai_when_to_use)),
        ("keywords".to_owned(), to_value(&item.keywords)),
        ("children_slugs".to_owned(), to_value(&item.children_slugs)),
        ("related_slugs".to_owned(), to_value(&item.related_slugs)),
        ("linked_epic_ids".to_owned(), to_value(&item.linked_epic_ids)),
        ("tags".to_owned(), to_value(&item.tags)),
        ("created_at".to_owned(), to_value(&item.created_at)),
        ("updated_at".to_owned(), to_value(&item.updated_at)),
    ];
    Document {
        header,
        body: item.ai_requirements.clone(),
    }
}

/// Render one troubleshoot item as a document.
#[must_use]
pub fn render_troubleshoot(item: &TroubleshootItem) -> Document {
    let header = vec![
        ("slug".to_owned(), Value::from(item.slug.clone())),
        ("type".to_owned(), Value::from("troubleshoot")),
        ("namespace".to_owned(), to_value(&item.namespace)),
        ("id".to_owned(), to_value(&item.id)),
        ("title".to_owned(), Value::from(item.title.clone())),
        ("ai_use_case".to_owned(), to_value(&item.ai_use_case)),
        ("keywords".to_owned(), to_value(&item.keywords)),
        ("tags".to_owned(), to_value(&item.tags)),
        ("usage_count".to_owned(), Value::from(item.usage_count)),
        ("success_count".to_owned(), Value::from(item.success_count)),
        ("created_at".to_owned(), to_value(&item.created_at)),
        ("updated_at".to_owned(), to_value(&item.updated_at)),
    ];
    Document {
        header,
        body: item.ai_solutions.clone(),
    }
}

/// Rebuild an architecture item from a document.
///
/// # Errors
///
/// Returns `ErrValidation` on missing or malformed header fields.
pub fn architecture_from_document(
    doc: &Document,
    namespace: &Namespace,
) -> Result<ArchitectureItem> {
    if doc.get_str("type")? != "architecture" {
        return Err(Error::validation("document is not an architecture item"));
    }
    Ok(ArchitectureItem {
        id: doc
            .get("id")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_else(MemoryId::new),
        namespace: namespace.clone(),
        slug: doc.get_str("slug")?,
        title: doc.get_str("title")?,
        ai_requirements: doc.body.clone(),
        ai_when_to_use: string_list(doc, "ai_when_to_use"),
        keywords: string_list(doc, "keywords"),
        children_slugs: string_list(doc, "children_slugs"),
        related_slugs: string_list(doc, "related_slugs"),
        linked_epic_ids: doc
            .get("linked_epic_ids")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default(),
        tags: string_list(doc, "tags"),
        created_at: parse_timestamp(doc, "created_at")?,
        updated_at: parse_timestamp(doc, "updated_at")?,
    })
}

/// Rebuild a troubleshoot item from a document.
///
/// # Errors
///
/// Returns `ErrValidation` on missing or malformed header fields.
pub fn troubleshoot_from_document(
    doc: &Document,
    namespace: &Namespace,
) -> Result<TroubleshootItem> {
    if doc.get_str("type")? != "troubleshoot" {
        return Err(Error::validation("document is not a troubleshoot item"));
    }
    let usage_count = doc.get("usage_count").and_then(Value::as_u64).unwrap_or(0);
    let success_count = doc
        .get("success_count")
        .and_then(Value::as_u64)
        .unwrap_or(0)
        .min(usage_count);
    Ok(TroubleshootItem {
        id: doc
            .get("id")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_else(MemoryId::new),
        namespace: namespace.clone(),
        slug: doc.get_str("slug")?,
        title: doc.get_str("title")?,
        ai_solutions: doc.body.clone(),
        ai_use_case: string_list(doc, "ai_use_case"),
        keywords: string_list(doc, "keywords"),
        tags: string_list(doc, "tags"),
        usage_count,
        success_count,
        created_at: parse_timestamp(doc, "created_at")?,
        updated_at: parse_timestamp(doc, "updated_at")?,
    })
}

/// Entity kind declared in a document header.
///
/// # Errors
///
/// Returns `ErrValidation` when the header lacks a known `type`.
pub fn document_kind(doc: &Document) -> Result<Option<MemoryKind>> {
    match doc.get_str("type")?.as_str() {
        "work_item" => Ok(None),
        "architecture" => Ok(Some(MemoryKind::Architecture)),
        "troubleshoot" => Ok(Some(MemoryKind::Troubleshoot)),
        other => Err(Error::validation(format!("unknown document type '{other}'"))),
    }
}
