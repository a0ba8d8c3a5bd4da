
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::GatewayError;
use crate::config::RemoteEmbeddingConfig;
use crate::embeddings::provider::EmbeddingTier;

/// Client for a hosted OpenAI-compatible embeddings endpoint.
///
/// The whole batch goes out in one call; any transport error, non-2xx
/// status, or count mismatch is a tier failure and the caller falls through
/// to the next tier, so no retrying happens here.
#[derive(Debug, Clone)]
pub struct RemoteEmbeddingClient {
    endpoint: Url,
    api_key: String,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingObject>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    embedding: Vec<f32>,
}

impl RemoteEmbeddingClient {
    pub const NAME: &'static str = "remote";

    #[inline]
    pub fn new(config: &RemoteEmbeddingConfig) -> Result<Self> {
        let endpoint = format!("{}/embeddings", config.api_url.trim_end_matches('/'));
        let endpoint = Url::parse(&endpoint)
            .with_context(|| format!("Invalid remote embedding endpoint: {}", endpoint))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            agent,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// Request embeddings for the full batch in a single call.
    #[inline]
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Requesting {} embeddings from {}",
            texts.len(),
            self.endpoint
        );

        let request = EmbeddingsRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embeddings request")?;

        let response_text = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| anyhow::anyhow!("Embeddings request failed: {}", e))?;

        let response: EmbeddingsResponse = serde_json::from_str(&response_text)
            .context("Failed to parse embeddings response")?;

        if response.data.len() != texts.len() {
            warn!(
                "Embedding count mismatch: requested {}, received {}",
                texts.len(),
                response.data.len()
            );
            return Err(anyhow::anyhow!(
                "Embedding count mismatch: requested {}, received {}",
                texts.len(),
                response.data.len()
            ));
        }

        debug!("Received {} embeddings", response.data.len());
        Ok(response.data.into_iter().map(|obj| obj.embedding).collect())
    }
}

impl EmbeddingTier for RemoteEmbeddingClient {
    #[inline]
    fn name(&self) -> &'static str {
        Self::NAME
    }

    #[inline]
    fn embed(&self, texts: &[String]) -> crate::Result<Vec<Vec<f32>>> {
        self.embed_batch(texts)
            .map_err(|e| GatewayError::Embedding(e.to_string()))
    }
}
