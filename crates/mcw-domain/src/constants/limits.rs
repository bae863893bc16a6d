//! Field length and count limits enforced on write.

/// Maximum work-item title length in characters
pub const TITLE_MAX_CHARS: usize = 200;

/// Maximum markdown body length (description, requirements, solutions)
pub const MARKDOWN_MAX_CHARS: usize = 10_000;

/// Maximum acceptance criteria entries per work item
pub const ACCEPTANCE_CRITERIA_MAX: usize = 20;

/// Maximum memory slug length
pub const SLUG_MAX_CHARS: usize = 100;

/// Maximum `ai_when_to_use` / `ai_use_case` bullets per memory item
pub const USE_CASE_MAX: usize = 10;

/// Maximum keywords per memory item
pub const KEYWORDS_MAX: usize = 20;

/// Maximum child links per architecture item
pub const CHILDREN_SLUGS_MAX: usize = 50;

/// Maximum related links per architecture item
pub const RELATED_SLUGS_MAX: usize = 20;

/// Maximum linked epics per architecture item
pub const LINKED_EPICS_MAX: usize = 20;

/// Maximum namespace name length
pub const NAMESPACE_MAX_CHARS: usize = 64;
