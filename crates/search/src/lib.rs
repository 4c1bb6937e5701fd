//! # DocCtx Search
//!
//! Per-request context assembly for a documentation target.
//!
//! ```text
//! target unit
//!     │
//!     ├──> Similarity Index (over-fetch k, relevance floor)  -> semantic scores
//!     ├──> Dependency Graph (expand, max hops)               -> decay^hops
//!     │
//!     ├──> Merge (max | weighted sum), exclude target + filtered units
//!     ├──> Sort (score desc, id asc)
//!     └──> Budget Packer (greedy, skip on overflow, never truncate)
//!            └─> ContextBundle
//! ```

mod assembler;
mod config;
mod context_pack;
mod error;
mod filter;
mod fusion;
mod packer;

pub use assembler::ContextAssembler;
pub use config::{AssemblerConfig, DocCtxConfig};
pub use context_pack::{
    BundleItem, ContextBundle, ContextBundleBudget, ContextCandidate, Provenance,
    CONTEXT_BUNDLE_VERSION,
};
pub use error::{Result, SearchError};
pub use filter::{ExcludeRules, UnitFilter};
pub use fusion::{structural_score, MergeStrategy};
pub use packer::{pack, PackOutcome};
