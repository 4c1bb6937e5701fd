use crate::unit::StructuralUnit;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cost of placing a unit into a context window
pub trait SizeMeasure: Send + Sync {
    fn cost(&self, unit: &StructuralUnit) -> usize;
}

impl<F> SizeMeasure for F
where
    F: Fn(&StructuralUnit) -> usize + Send + Sync,
{
    fn cost(&self, unit: &StructuralUnit) -> usize {
        self(unit)
    }
}

/// Cost = number of characters of source text
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCount;

impl SizeMeasure for CharCount {
    fn cost(&self, unit: &StructuralUnit) -> usize {
        unit.text().chars().count()
    }
}

/// Cost = rough token estimate (4 characters per token, rounded up)
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenEstimate;

impl TokenEstimate {
    const CHARS_PER_TOKEN: usize = 4;
}

impl SizeMeasure for TokenEstimate {
    fn cost(&self, unit: &StructuralUnit) -> usize {
        unit.text().chars().count().div_ceil(Self::CHARS_PER_TOKEN)
    }
}

/// Configurable choice of built-in measure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMeasureKind {
    #[default]
    Chars,
    Tokens,
}

impl SizeMeasureKind {
    #[must_use]
    pub fn build(self) -> Arc<dyn SizeMeasure> {
        match self {
            Self::Chars => Arc::new(CharCount),
            Self::Tokens => Arc::new(TokenEstimate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{SourceSpan, UnitKind};

    fn unit_with_text(text: &str) -> StructuralUnit {
        StructuralUnit::new("m.rs", "f", UnitKind::Function, SourceSpan::new(1, 1, text))
    }

    #[test]
    fn test_char_count_counts_chars_not_bytes() {
        assert_eq!(CharCount.cost(&unit_with_text("héllo")), 5);
    }

    #[test]
    fn test_token_estimate_rounds_up() {
        assert_eq!(TokenEstimate.cost(&unit_with_text("abcde")), 2);
        assert_eq!(TokenEstimate.cost(&unit_with_text("abcd")), 1);
        assert_eq!(TokenEstimate.cost(&unit_with_text("")), 0);
    }

    #[test]
    fn test_closures_are_measures() {
        let lines = |unit: &StructuralUnit| unit.span.line_count();
        assert_eq!(lines.cost(&unit_with_text("x")), 1);
    }
}
