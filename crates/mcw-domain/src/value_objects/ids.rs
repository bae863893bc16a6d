//! Strong-typed UUID identifiers for all domain entities.

use crate::define_id;

define_id!(WorkItemId, "Strong typed identifier for a work item");
define_id!(MemoryId, "Strong typed identifier for a memory item");
define_id!(
    SessionId,
    "Strong typed identifier for a transport session"
);
define_id!(
    ExecutionId,
    "Strong typed identifier for an advisory execution record"
);
