use crate::config::AssemblerConfig;
use crate::error::Result;
use docctx_units::{StructuralUnit, UnitKind};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Caller-supplied predicate deciding whether a unit may enter a bundle
pub trait UnitFilter: Send + Sync {
    fn accepts(&self, unit: &StructuralUnit) -> bool;
}

impl<F> UnitFilter for F
where
    F: Fn(&StructuralUnit) -> bool + Send + Sync,
{
    fn accepts(&self, unit: &StructuralUnit) -> bool {
        self(unit)
    }
}

/// Configured exclusions: unit kinds and file path globs
#[derive(Debug, Clone)]
pub struct ExcludeRules {
    kinds: Vec<UnitKind>,
    paths: GlobSet,
}

impl ExcludeRules {
    pub fn new(kinds: &[UnitKind], path_patterns: &[String]) -> Result<Self> {
        Ok(Self {
            kinds: kinds.to_vec(),
            paths: build_globset(path_patterns)?,
        })
    }

    pub fn from_config(config: &AssemblerConfig) -> Result<Self> {
        Self::new(&config.exclude_kinds, &config.exclude_paths)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty() && self.paths.is_empty()
    }
}

impl UnitFilter for ExcludeRules {
    fn accepts(&self, unit: &StructuralUnit) -> bool {
        !self.kinds.contains(&unit.kind) && !self.paths.is_match(&unit.file_path)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
