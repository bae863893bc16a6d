//! Service-layer constants.

/// Items reported under `recently_updated` in analytics
pub const ANALYTICS_RECENT_ITEMS: usize = 10;

/// Default result cap for the troubleshoot matcher
pub const MATCH_DEFAULT_LIMIT: usize = 5;

/// Sentences of a child's requirements included in smart context before
/// the budget forces summary mode
pub const CONTEXT_CHILD_SENTENCES: usize = 3;

/// Sentences included per item once the token budget is exceeded
pub const CONTEXT_SUMMARY_SENTENCES: usize = 2;

/// Sentences of a related item's requirements included as a blurb
pub const CONTEXT_RELATED_SENTENCES: usize = 1;
