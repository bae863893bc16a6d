//! Use-case services.

/// Smart retrieval: context assembly and the problem matcher
pub mod context_service;
/// Pure hierarchy computations
pub mod hierarchy;
/// Memory store CRUD and retrieval
pub mod memory_service;
/// Work-item search
pub mod search_service;
/// Namespace export/import/backup/restore
pub mod sync_service;
/// The work-item graph engine
pub mod work_item_service;

use mcw_domain::constants::{DEFAULT_LIMIT, MAX_LIMIT};

/// Clamp a client-supplied limit to the allowed range.
#[must_use]
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}
