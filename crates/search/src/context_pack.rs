use docctx_units::{UnitId, UnitKind};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const CONTEXT_BUNDLE_VERSION: u32 = 1;

/// Which retrieval signal found a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Semantic,
    Structural,
    Both,
}

impl Provenance {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::Structural => "structural",
            Self::Both => "both",
        }
    }
}

/// Ranked candidate before packing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextCandidate {
    pub unit_id: UnitId,
    pub score: f32,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hops: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleItem {
    pub id: UnitId,
    pub kind: UnitKind,
    pub qualified_name: String,
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub score: f32,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hops: Option<usize>,
    pub cost: usize,
    pub content: String,
}

/// Packed context for one target, in ranked order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    pub version: u32,
    pub target: UnitId,
    pub items: Vec<BundleItem>,
    pub budget: ContextBundleBudget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBundleBudget {
    pub max_cost: usize,
    pub used_cost: usize,
    pub skipped_items: usize,
    pub oversized_items: usize,
}

impl ContextBundle {
    #[must_use]
    pub fn total_cost(&self) -> usize {
        self.budget.used_cost
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &UnitId> {
        self.items.iter().map(|item| &item.id)
    }

    /// `(unit id, source text, kind)` triples for the generation step
    pub fn entries(&self) -> impl Iterator<Item = (&UnitId, &str, UnitKind)> {
        self.items
            .iter()
            .map(|item| (&item.id, item.content.as_str(), item.kind))
    }

    /// Plain-text context block, one header per item
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = writeln!(
                out,
                "Related {} {} (score: {:.2})",
                item.kind, item.qualified_name, item.score
            );
            out.push_str(item.content.trim_end());
            out.push('\n');
        }
        out
    }
}
