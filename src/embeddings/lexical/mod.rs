
use std::collections::{BTreeSet, HashMap};

use crate::Result;
use crate::embeddings::provider::EmbeddingTier;

/// Dependency-free term-frequency encoder, the terminal fallback tier.
///
/// The vocabulary is the sorted set of distinct lower-cased whitespace
/// tokens of the batch, so encoding is deterministic for identical input.
/// Dimensionality equals the vocabulary size and therefore varies per batch;
/// callers must treat a batch from this tier as index-invalidating and never
/// mix its vectors with vectors from another call.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalEncoder;

impl LexicalEncoder {
    pub const NAME: &'static str = "lexical";

    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Encode a batch as term-frequency vectors over the batch vocabulary.
    #[inline]
    pub fn encode(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let mut vocab = BTreeSet::new();
        for text in texts {
            for token in text.to_lowercase().split_whitespace() {
                vocab.insert(token.to_string());
            }
        }

        let positions: HashMap<&str, usize> = vocab
            .iter()
            .enumerate()
            .map(|(position, token)| (token.as_str(), position))
            .collect();

        texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; vocab.len()];
                for token in text.to_lowercase().split_whitespace() {
                    if let Some(&position) = positions.get(token) {
                        vector[position] += 1.0;
                    }
                }
                vector
            })
            .collect()
    }
}

impl EmbeddingTier for LexicalEncoder {
    #[inline]
    fn name(&self) -> &'static str {
        Self::NAME
    }

    #[inline]
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(self.encode(texts))
    }
}
