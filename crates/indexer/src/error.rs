use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Unit store error: {0}")]
    UnitStoreError(#[from] docctx_units::UnitStoreError),

    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] docctx_vector_store::VectorStoreError),

    #[error("Graph error: {0}")]
    GraphError(#[from] docctx_graph::GraphError),

    #[error("Embedding task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid indexer config: {0}")]
    InvalidConfig(String),
}
