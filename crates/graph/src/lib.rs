//! # DocCtx Graph
//!
//! Directed "references" graph between structural units: calls, imports,
//! inheritance and instantiation.
//!
//! ## Architecture
//!
//! ```text
//! UnitStore + RawReference[]
//!     │
//!     ├──> Graph Builder
//!     │      ├─ Register every unit as a node
//!     │      ├─ Resolve reference targets (id, qualified name, short name)
//!     │      └─ Drop dangling references (external symbols), count them
//!     │
//!     └──> Dependency Graph (petgraph)
//!            ├─ neighbors (one hop, direction + kind filter)
//!            └─ expand    (BFS within max hops, min distance, cycle safe)
//! ```

mod builder;
mod error;
mod graph;
mod types;

pub use builder::{GraphBuildReport, GraphBuilder, RawReference};
pub use error::{GraphError, Result};
pub use graph::{DependencyGraph, GraphStats};
pub use types::{EdgeKind, Reach, ReferenceEdge, TraversalDirection};
