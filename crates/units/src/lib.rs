//! # DocCtx Units
//!
//! Structural units (modules, classes, functions, methods) produced by the
//! parser, and the in-memory store the rest of the engine reads them from.
//!
//! ```text
//! Parser output (per file)
//!     │
//!     ├──> StructuralUnit[]   (stable ids: path::qualified_name)
//!     │
//!     └──> UnitStore
//!            ├─ put / get / remove_file
//!            └─ children_of (source order)
//! ```
//!
//! Unit size is measured by a pluggable [`SizeMeasure`]; the rest of the
//! engine treats the cost as an opaque positive integer.

mod error;
mod language;
mod measure;
mod store;
mod unit;

pub use error::{Result, UnitStoreError};
pub use language::Language;
pub use measure::{CharCount, SizeMeasure, SizeMeasureKind, TokenEstimate};
pub use store::UnitStore;
pub use unit::{SourceSpan, StructuralUnit, UnitId, UnitKind};
