//! Search, ranking, and retrieval constants.

/// Default result limit for list and search operations
pub const DEFAULT_LIMIT: usize = 10;

/// Hard ceiling on any list or search limit
pub const MAX_LIMIT: usize = 200;

/// Reciprocal-rank-fusion constant `k` in `1 / (k + rank)`
pub const RRF_K: f32 = 60.0;

/// Candidate over-fetch multiplier for hybrid search
pub const HYBRID_CANDIDATE_MULTIPLIER: usize = 3;

/// BM25 term-frequency saturation
pub const BM25_K1: f32 = 1.2;

/// BM25 length normalization
pub const BM25_B: f32 = 0.75;

/// Troubleshoot matcher weight on vector similarity
pub const MATCH_SIMILARITY_WEIGHT: f64 = 1.0;

/// Troubleshoot matcher weight on success rate
pub const MATCH_SUCCESS_WEIGHT: f64 = 0.4;

/// Troubleshoot matcher weight on `ln(1 + usage_count)`
pub const MATCH_USAGE_WEIGHT: f64 = 0.1;

/// Default candidate pool for the troubleshoot matcher
pub const MATCH_CANDIDATES: usize = 10;

/// Approximate characters per token for context budgeting
pub const CHARS_PER_TOKEN: usize = 4;

/// Default token budget for smart context assembly
pub const DEFAULT_TOKEN_BUDGET: usize = 4000;

/// Default BFS depth cap for smart context assembly
pub const DEFAULT_CONTEXT_DEPTH: usize = 2;
