//! Progress derivation constants.

/// Leaf progress for `not_started`
pub const NOT_STARTED_LEAF_PROGRESS: f64 = 0.0;

/// Leaf progress for `in_progress`
pub const IN_PROGRESS_LEAF_PROGRESS: f64 = 0.5;

/// Leaf progress contributed by a `blocked` leaf to parent averaging.
///
/// The upstream implementations disagreed between 0.0 and 0.25; this build
/// fixes it at 0.25.
pub const BLOCKED_LEAF_PROGRESS: f64 = 0.25;

/// Leaf progress for `completed`
pub const COMPLETED_LEAF_PROGRESS: f64 = 1.0;

/// Tolerance when comparing recomputed progress against stored values
pub const PROGRESS_EPSILON: f64 = 1e-9;
