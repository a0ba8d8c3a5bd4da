
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::config::GenerationConfig;
use crate::{GatewayError, Result};

/// External text-generation collaborator.
///
/// Narrow contract: a final prompt string in, raw text or a typed failure
/// out. Injected into the gateway as a trait object.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-style chat-completions client.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    endpoint: Url,
    api_key: String,
    model: String,
    system_prompt: String,
    temperature: f32,
    top_p: f32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    stream: bool,
    messages: Vec<ChatMessage>,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl HttpGenerationClient {
    #[inline]
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.api_url)
            .map_err(|_| GatewayError::Config(format!("Invalid generation API URL: {}", config.api_url)))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            agent,
        })
    }

    fn call(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            stream: false,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let request_json = serde_json::to_string(&request)
            .map_err(|e| GatewayError::Generation(format!("Failed to serialize request: {}", e)))?;

        debug!("Sending generation request to {}", self.endpoint);

        let response_text = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| {
                error!("Generation request failed: {}", e);
                GatewayError::Generation(format!("Request failed: {}", e))
            })?;

        let response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| GatewayError::Generation(format!("Failed to parse response: {}", e)))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::Generation("Response contained no choices".to_string()))?;

        debug!("Received generation response ({} chars)", content.len());
        Ok(content)
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationClient {
    #[inline]
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.call(prompt)
    }
}
