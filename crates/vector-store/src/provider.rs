use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;

/// External embedding backend: text in, fixed-dimension vector out.
///
/// Implementations must be `Send + Sync`; the indexer calls `embed` from
/// several tasks at once.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the model; part of every cache fingerprint
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Offline provider based on feature hashing of identifier tokens.
///
/// Cheap and deterministic; useful when no model is configured and in tests.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub const DEFAULT_DIMENSION: usize = 256;

    #[must_use]
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("hashing-{dimension}"),
        }
    }

    /// Embed synchronously (the async trait method delegates here)
    #[must_use]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            let bucket = u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as usize
                % self.dimension;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(VectorStoreError::EmbeddingError(
                "cannot embed empty text".to_string(),
            ));
        }
        Ok(self.embed_text(text))
    }
}

/// Lowercased identifier tokens; snake_case and camelCase are split apart
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .flat_map(split_camel_case)
        .map(|word| word.to_lowercase())
}

fn split_camel_case(word: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev_lower = false;
    for (idx, ch) in word.char_indices() {
        if ch.is_uppercase() && prev_lower && idx > start {
            parts.push(&word[start..idx]);
            start = idx;
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
    }
    parts.push(&word[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::cosine_similarity;

    #[test]
    fn test_camel_and_snake_case_share_tokens() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_text("parseConfigFile");
        let b = embedder.embed_text("parse_config_file");
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_output_is_unit_length_and_deterministic() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed_text("fn load_index(path: &Path)");
        let norm = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert_eq!(a, embedder.embed_text("fn load_index(path: &Path)"));
    }

    #[tokio::test]
    async fn test_empty_text_is_an_error() {
        let embedder = HashingEmbedder::new(8);
        assert!(embedder.embed("   ").await.is_err());
        assert_eq!(embedder.model_id(), "hashing-8");
    }
}
