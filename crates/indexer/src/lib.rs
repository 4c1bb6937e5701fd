//! # DocCtx Indexer
//!
//! Batch build phase and incremental re-index for context assembly.
//!
//! ## Pipeline
//!
//! ```text
//! ParsedFile[] (units + raw references)
//!     │
//!     ├──> Unit Store
//!     │
//!     ├──> Embedding (template render, cache lookup, provider in batches)
//!     │      └─> Similarity Index
//!     │
//!     └──> Graph Builder
//!            └─> Dependency Graph
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use docctx_indexer::{CodebaseIndexer, IndexerConfig, ParsedFile};
//! use docctx_vector_store::HashingEmbedder;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Arc::new(HashingEmbedder::new(HashingEmbedder::DEFAULT_DIMENSION));
//!     let indexer = CodebaseIndexer::new(provider, IndexerConfig::default())?;
//!     let files: Vec<ParsedFile> = Vec::new();
//!     let (index, stats) = indexer.build(files).await?;
//!
//!     println!("Indexed {} units, {} edges", stats.units, index.graph.edge_count());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod indexer;
mod parsed;
mod stats;

pub use config::IndexerConfig;
pub use error::{IndexerError, Result};
pub use indexer::{CodebaseIndex, CodebaseIndexer};
pub use parsed::ParsedFile;
pub use stats::IndexStats;
