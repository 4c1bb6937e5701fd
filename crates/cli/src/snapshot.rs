use anyhow::{Context, Result};
use docctx_indexer::{CodebaseIndex, CodebaseIndexer, IndexStats, IndexerConfig, ParsedFile};
use docctx_units::UnitId;
use docctx_vector_store::HashingEmbedder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Parsed codebase as handed over by an external parser, optionally with
/// vectors from an external embedding provider.
///
/// ```json
/// {
///   "files": [{ "file_path": "...", "units": [...], "references": [...] }],
///   "vectors": { "src/a.py::f": [0.1, 0.2] }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub files: Vec<ParsedFile>,
    /// Precomputed embeddings by unit id; when empty, units are embedded
    /// with the offline hashing embedder
    #[serde(default)]
    pub vectors: BTreeMap<UnitId, Vec<f32>>,
}

impl Snapshot {
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        let snapshot: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("invalid snapshot {}", path.display()))?;
        log::debug!(
            "Loaded snapshot {} ({} files, {} vectors)",
            path.display(),
            snapshot.files.len(),
            snapshot.vectors.len()
        );
        Ok(snapshot)
    }

    pub async fn index(self, config: IndexerConfig) -> Result<(CodebaseIndex, IndexStats)> {
        let provider = Arc::new(HashingEmbedder::new(HashingEmbedder::DEFAULT_DIMENSION));
        let indexer = CodebaseIndexer::new(provider, config)?;

        let built = if self.vectors.is_empty() {
            indexer.build(self.files).await?
        } else {
            indexer.build_precomputed(self.files, self.vectors).await?
        };
        Ok(built)
    }
}
