//! Entity/record conversion for the vector store.
//!
//! Entities are stored with their full serde representation as the record's
//! scalar fields, so scan predicates and payload shaping read the same
//! shapes the wire uses.

use mcw_domain::entities::{ArchitectureItem, TroubleshootItem, WorkItem};
use mcw_domain::error::{Error, Result};
use mcw_domain::ports::StoredRecord;

/// Serialize a work item into its stored record.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn work_item_to_record(item: &WorkItem, vector: Option<Vec<f32>>) -> Result<StoredRecord> {
    Ok(StoredRecord {
        id: item.id.as_str(),
        fields: serde_json::to_value(item)?,
        search_text: item.search_text(),
        vector,
    })
}

/// Deserialize a stored record back into a work item.
///
/// # Errors
///
/// Returns an internal error when the record does not parse: stored state
/// is produced by this crate, so a mismatch means corruption.
pub fn record_to_work_item(record: &StoredRecord) -> Result<WorkItem> {
    serde_json::from_value(record.fields.clone())
        .map_err(|e| Error::internal(format!("corrupt work item record {}: {e}", record.id)))
}

/// Serialize an architecture item into its stored record.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn architecture_to_record(
    item: &ArchitectureItem,
    vector: Option<Vec<f32>>,
) -> Result<StoredRecord> {
    Ok(StoredRecord {
        id: item.slug.clone(),
        fields: serde_json::to_value(item)?,
        search_text: item.search_text(),
        vector,
    })
}

/// Deserialize a stored record back into an architecture item.
///
/// # Errors
///
/// Returns an internal error when the record does not parse.
pub fn record_to_architecture(record: &StoredRecord) -> Result<ArchitectureItem> {
    serde_json::from_value(record.fields.clone())
        .map_err(|e| Error::internal(format!("corrupt architecture record {}: {e}", record.id)))
}

/// Serialize a troubleshoot item into its stored record.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn troubleshoot_to_record(
    item: &TroubleshootItem,
    vector: Option<Vec<f32>>,
) -> Result<StoredRecord> {
    Ok(StoredRecord {
        id: item.slug.clone(),
        fields: serde_json::to_value(item)?,
        search_text: item.search_text(),
        vector,
    })
}

/// Deserialize a stored record back into a troubleshoot item.
///
/// # Errors
///
/// Returns an internal error when the record does not parse.
pub fn record_to_troubleshoot(record: &StoredRecord) -> Result<TroubleshootItem> {
    serde_json::from_value(record.fields.clone())
        .map_err(|e| Error::internal(format!("corrupt troubleshoot record {}: {e}", record.id)))
}
