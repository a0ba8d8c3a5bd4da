#[cfg(test)]
mod tests;

use tracing::{info, warn};

use crate::Result;
use crate::config::EmbeddingConfig;
use crate::embeddings::lexical::LexicalEncoder;
use crate::embeddings::local::LocalEmbeddingClient;
use crate::embeddings::remote::RemoteEmbeddingClient;

/// One ranked alternative in the embedding fallback chain.
pub trait EmbeddingTier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce one vector per input text, or fail the whole batch.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// A batch of vectors plus the tier that produced it.
///
/// Vectors from the lexical tier have per-batch dimensionality; callers must
/// not mix them with vectors from another call.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedBatch {
    pub vectors: Vec<Vec<f32>>,
    pub tier: &'static str,
}

/// Ordered fallback chain over embedding tiers.
///
/// Tiers are attempted in order; a failing tier yields to the next. The
/// lexical encoder is the unconditional terminal tier, so `embed` is total:
/// it always produces a full batch.
pub struct EmbeddingProvider {
    tiers: Vec<Box<dyn EmbeddingTier>>,
    fallback: LexicalEncoder,
}

impl EmbeddingProvider {
    #[inline]
    pub fn new(tiers: Vec<Box<dyn EmbeddingTier>>) -> Self {
        Self {
            tiers,
            fallback: LexicalEncoder::new(),
        }
    }

    /// Assemble the tier chain from configuration: remote service first,
    /// then the local embedding server, with lexical always terminal.
    #[inline]
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let mut tiers: Vec<Box<dyn EmbeddingTier>> = Vec::new();

        if config.remote.enabled {
            match RemoteEmbeddingClient::new(&config.remote) {
                Ok(client) => tiers.push(Box::new(client)),
                Err(e) => warn!("Remote embedding tier unavailable: {}", e),
            }
        }

        if config.local.enabled {
            match LocalEmbeddingClient::new(&config.local) {
                Ok(client) => tiers.push(Box::new(client)),
                Err(e) => warn!("Local embedding tier unavailable: {}", e),
            }
        }

        info!(
            "Embedding provider configured with {} tier(s) before lexical fallback",
            tiers.len()
        );

        Self::new(tiers)
    }

    /// Embed a batch, falling through tiers until one succeeds.
    #[inline]
    pub fn embed(&self, texts: &[String]) -> EmbeddedBatch {
        if texts.is_empty() {
            return EmbeddedBatch {
                vectors: Vec::new(),
                tier: LexicalEncoder::NAME,
            };
        }

        for tier in &self.tiers {
            match tier.embed(texts) {
                Ok(vectors) if vectors.len() == texts.len() => {
                    return EmbeddedBatch {
                        vectors,
                        tier: tier.name(),
                    };
                }
                Ok(vectors) => {
                    warn!(
                        "Embedding tier '{}' returned {} vectors for {} texts, falling back",
                        tier.name(),
                        vectors.len(),
                        texts.len()
                    );
                }
                Err(e) => {
                    warn!("Embedding tier '{}' failed: {}, falling back", tier.name(), e);
                }
            }
        }

        EmbeddedBatch {
            vectors: self.fallback.encode(texts),
            tier: LexicalEncoder::NAME,
        }
    }

    /// Tier names in attempt order, lexical fallback included.
    #[inline]
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers
            .iter()
            .map(|tier| tier.name())
            .chain(std::iter::once(LexicalEncoder::NAME))
            .collect()
    }
}
