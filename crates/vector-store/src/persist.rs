use crate::error::Result;
use crate::index::SimilarityIndex;
use crate::record::EmbeddingRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const INDEX_SCHEMA_VERSION: u32 = 1;

/// On-disk form of a similarity index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedIndex {
    pub schema_version: u32,
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    pub records: Vec<EmbeddingRecord>,
}

/// Write the index as JSON via a tmp file and rename
pub async fn save_index(path: &Path, model_id: &str, index: &SimilarityIndex) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let persisted = PersistedIndex {
        schema_version: INDEX_SCHEMA_VERSION,
        model_id: model_id.to_string(),
        dimension: index.dimension(),
        records: index.records(),
    };

    let bytes = serde_json::to_vec(&persisted)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    log::info!(
        "Saved {} vectors to {}",
        persisted.records.len(),
        path.display()
    );
    Ok(())
}

/// Load a persisted index; `None` when the file does not exist.
///
/// Norms are recomputed from the stored vectors and invalid records are
/// skipped. A model mismatch is logged as a warning and the vectors are still
/// loaded.
pub async fn load_index(
    path: &Path,
    expected_model: &str,
    merge_threshold: usize,
) -> Result<Option<SimilarityIndex>> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(None);
    }

    let bytes = tokio::fs::read(path).await?;
    let persisted: PersistedIndex = serde_json::from_slice(&bytes)?;

    if persisted.schema_version != INDEX_SCHEMA_VERSION {
        log::warn!(
            "Index {} has schema_version {} (expected {INDEX_SCHEMA_VERSION})",
            path.display(),
            persisted.schema_version
        );
    }
    if persisted.model_id != expected_model {
        log::warn!(
            "Model mismatch: saved={}, current={expected_model}",
            persisted.model_id
        );
    }

    let mut records = Vec::with_capacity(persisted.records.len());
    for stored in persisted.records {
        match EmbeddingRecord::new(stored.unit_id, stored.vector) {
            Ok(record) => records.push(record),
            Err(err) => log::warn!("Skipping persisted record: {err}"),
        }
    }

    let index = SimilarityIndex::with_merge_threshold(merge_threshold);
    index.build(records);
    Ok(Some(index))
}
