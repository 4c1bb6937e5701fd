use docctx_units::{UnitId, UnitStoreError};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Unit not found: {0}")]
    NotFound(UnitId),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Context assembly timed out after {0:?}")]
    Timeout(Duration),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid glob: {0}")]
    Glob(#[from] globset::Error),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] docctx_vector_store::VectorStoreError),

    #[error("Indexer error: {0}")]
    Indexer(#[from] docctx_indexer::IndexerError),

    #[error("Assembly task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<UnitStoreError> for SearchError {
    fn from(err: UnitStoreError) -> Self {
        match err {
            UnitStoreError::NotFound(id) => Self::NotFound(id),
        }
    }
}
