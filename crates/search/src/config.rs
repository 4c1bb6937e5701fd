use crate::error::{Result, SearchError};
use crate::fusion::MergeStrategy;
use docctx_indexer::IndexerConfig;
use docctx_units::{SizeMeasureKind, UnitKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `[assembler]` section of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssemblerConfig {
    /// Minimum cosine similarity for a semantic candidate, in [0, 1]
    #[serde(default = "default_relevance_floor")]
    pub relevance_floor: f32,
    /// Semantic over-fetch relative to the expected number of slots
    #[serde(default = "default_overfetch_multiplier")]
    pub overfetch_multiplier: usize,
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
    /// Default context budget, in the configured size unit
    #[serde(default = "default_budget")]
    pub budget: usize,
    /// Structural score per hop: `structural_decay^hops`, in (0, 1]
    #[serde(default = "default_structural_decay")]
    pub structural_decay: f32,
    #[serde(default)]
    pub merge: MergeStrategy,
    #[serde(default)]
    pub size_measure: SizeMeasureKind,
    #[serde(default)]
    pub exclude_kinds: Vec<UnitKind>,
    /// Glob patterns matched against unit file paths
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

fn default_relevance_floor() -> f32 {
    0.3
}

fn default_overfetch_multiplier() -> usize {
    4
}

fn default_max_hops() -> usize {
    2
}

fn default_budget() -> usize {
    6000
}

fn default_structural_decay() -> f32 {
    0.5
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            relevance_floor: default_relevance_floor(),
            overfetch_multiplier: default_overfetch_multiplier(),
            max_hops: default_max_hops(),
            budget: default_budget(),
            structural_decay: default_structural_decay(),
            merge: MergeStrategy::default(),
            size_measure: SizeMeasureKind::default(),
            exclude_kinds: Vec::new(),
            exclude_paths: Vec::new(),
        }
    }
}

impl AssemblerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.relevance_floor) {
            return Err(SearchError::InvalidConfig(format!(
                "relevance_floor must be in [0, 1], got {}",
                self.relevance_floor
            )));
        }
        if self.overfetch_multiplier == 0 {
            return Err(SearchError::InvalidConfig(
                "overfetch_multiplier must be >= 1".to_string(),
            ));
        }
        if self.budget == 0 {
            return Err(SearchError::InvalidConfig("budget must be > 0".to_string()));
        }
        if !(self.structural_decay > 0.0 && self.structural_decay <= 1.0) {
            return Err(SearchError::InvalidConfig(format!(
                "structural_decay must be in (0, 1], got {}",
                self.structural_decay
            )));
        }
        self.merge.validate()
    }
}

/// Whole configuration file: `[assembler]` and `[indexer]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocCtxConfig {
    #[serde(default)]
    pub assembler: AssemblerConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
}

impl DocCtxConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.assembler.validate()?;
        self.indexer.validate()?;
        Ok(())
    }
}
