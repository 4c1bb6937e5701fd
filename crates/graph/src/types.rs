use docctx_units::UnitId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of reference from one unit to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Calls,
    Imports,
    Inherits,
    Instantiates,
}

impl EdgeKind {
    pub const ALL: [Self; 4] = [Self::Calls, Self::Imports, Self::Inherits, Self::Instantiates];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calls => "calls",
            Self::Imports => "imports",
            Self::Inherits => "inherits",
            Self::Instantiates => "instantiates",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved, directed reference between two known units
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub source: UnitId,
    pub target: UnitId,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalDirection {
    /// Follow edges from source to target (what the unit references)
    Outgoing,
    /// Follow edges backwards (what references the unit)
    Incoming,
    #[default]
    Both,
}

/// A unit reached by graph expansion, with its minimum hop distance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reach {
    pub id: UnitId,
    pub hops: usize,
}
