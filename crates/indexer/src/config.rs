use crate::error::{IndexerError, Result};
use docctx_vector_store::DEFAULT_MERGE_THRESHOLD;
use serde::{Deserialize, Serialize};

/// `[indexer]` section of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexerConfig {
    /// Units embedded concurrently per batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Embedding cache entries kept across passes
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Tail size at which the similarity index merges into a new base
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: usize,
}

fn default_concurrency() -> usize {
    16
}

fn default_cache_capacity() -> usize {
    50_000
}

fn default_merge_threshold() -> usize {
    DEFAULT_MERGE_THRESHOLD
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            cache_capacity: default_cache_capacity(),
            merge_threshold: default_merge_threshold(),
        }
    }
}

impl IndexerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(IndexerError::InvalidConfig(
                "concurrency must be >= 1".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(IndexerError::InvalidConfig(
                "cache_capacity must be >= 1".to_string(),
            ));
        }
        if self.merge_threshold == 0 {
            return Err(IndexerError::InvalidConfig(
                "merge_threshold must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
