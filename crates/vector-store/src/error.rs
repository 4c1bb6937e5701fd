use docctx_units::UnitId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector for {unit}: {reason}")]
    InvalidVector { unit: UnitId, reason: String },

    #[error("Embedding unavailable for {unit}: {reason}")]
    EmbeddingUnavailable { unit: UnitId, reason: String },

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
