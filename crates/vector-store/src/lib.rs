//! # DocCtx Vector Store
//!
//! Embedding records, the cosine similarity index, the embedding cache and the
//! seam to external embedding providers.
//!
//! ```text
//! StructuralUnit
//!     │
//!     ├──> EmbeddingTemplates   (unit -> text sent to the provider)
//!     ├──> EmbeddingProvider    (text -> vector, external)
//!     ├──> EmbeddingCache       (unit id + content hash -> record, LRU)
//!     │
//!     └──> SimilarityIndex
//!            ├─ build   (atomic snapshot replace)
//!            ├─ upsert  (append-only tail segment, merged past a threshold)
//!            └─ query   (exact cosine, score desc / id asc)
//! ```

mod cache;
mod error;
mod index;
mod persist;
mod provider;
mod record;
mod templates;

pub use cache::{content_hash, EmbeddingCache};
pub use error::{Result, VectorStoreError};
pub use index::{SimilarityIndex, DEFAULT_MERGE_THRESHOLD};
pub use persist::{load_index, save_index, PersistedIndex, INDEX_SCHEMA_VERSION};
pub use provider::{EmbeddingProvider, HashingEmbedder};
pub use record::{cosine_similarity, EmbeddingRecord, SearchHit};
pub use templates::{EmbeddingTemplates, UnitTemplates, EMBEDDING_TEMPLATES_SCHEMA_VERSION};
