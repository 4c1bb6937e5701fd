use serde::{Deserialize, Serialize};

/// Tally of one build or re-index pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub files: usize,
    pub units: usize,
    /// Units embedded by the provider during this pass
    pub embedded: usize,
    /// Units served from the embedding cache
    pub cached: usize,
    /// Units left without a vector (provider failure, bad vector, template error)
    pub failed: usize,
    pub edges: usize,
    pub dangling_edges: usize,
    /// Records dropped from the index and cache because their unit is gone
    pub pruned: usize,
    pub time_ms: u64,
}
