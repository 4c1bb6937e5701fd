use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};

/// How semantic and structural scores combine when a unit has both
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Best single signal; a unit found twice is not counted twice
    #[default]
    Max,
    /// `semantic * w_s + structural * w_t`, a missing signal contributes 0
    WeightedSum { semantic: f32, structural: f32 },
}

impl MergeStrategy {
    /// Final ranking score from the contributing signals
    #[must_use]
    pub fn combine(self, semantic: Option<f32>, structural: Option<f32>) -> f32 {
        match self {
            Self::Max => match (semantic, structural) {
                (Some(s), Some(t)) => s.max(t),
                (Some(s), None) => s,
                (None, Some(t)) => t,
                (None, None) => 0.0,
            },
            Self::WeightedSum {
                semantic: w_s,
                structural: w_t,
            } => semantic.unwrap_or(0.0) * w_s + structural.unwrap_or(0.0) * w_t,
        }
    }

    pub fn validate(self) -> Result<()> {
        if let Self::WeightedSum {
            semantic,
            structural,
        } = self
        {
            let valid = |w: f32| w.is_finite() && w >= 0.0;
            if !valid(semantic) || !valid(structural) {
                return Err(SearchError::InvalidConfig(
                    "merge weights must be finite and non-negative".to_string(),
                ));
            }
            if semantic + structural <= 0.0 {
                return Err(SearchError::InvalidConfig(
                    "merge weights must not both be zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Hop distance to structural score: `decay^hops`, strictly decreasing in
/// `hops` for any decay in (0, 1)
#[must_use]
pub fn structural_score(decay: f32, hops: usize) -> f32 {
    let exponent = i32::try_from(hops).unwrap_or(i32::MAX);
    decay.powi(exponent)
}
