
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::GatewayError;
use crate::admission::{ConcurrencyGate, RateLimiter};
use crate::cache::{ResponseCache, fingerprint};
use crate::config::Config;
use crate::generation::GenerationBackend;
use crate::knowledge::RetrievalEngine;
use crate::metrics::{MetricsSink, MetricsSnapshot, RequestOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
}

impl OutputFormat {
    #[inline]
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Text => "text/plain",
            OutputFormat::Markdown => "text/markdown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub client_id: String,
    pub prompt: String,
    #[serde(default)]
    pub format: OutputFormat,
    /// Absent means the process-wide retrieval default applies.
    #[serde(default)]
    pub use_retrieval: Option<bool>,
}

/// Transport-agnostic response: a status code plus a JSON body, handed to
/// whatever HTTP layer sits in front of the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn rejection(status: u16, error: &GatewayError) -> Self {
        Self {
            status,
            body: json!({
                "error": error.to_string(),
                "code": error.code(),
            }),
        }
    }
}

/// Per-request orchestrator composing admission control, the response
/// cache, retrieval, and the generation collaborator.
///
/// Construct once at process start and share; every entry point takes
/// `&self` and is safe under concurrent use.
pub struct Gateway {
    limiter: RateLimiter,
    gate: ConcurrencyGate,
    cache: ResponseCache,
    metrics: MetricsSink,
    retrieval: Arc<RetrievalEngine>,
    backend: Arc<dyn GenerationBackend>,
    enable_cache: bool,
    retrieval_default: bool,
}

impl Gateway {
    #[inline]
    pub fn new(
        config: &Config,
        retrieval: Arc<RetrievalEngine>,
        backend: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            limiter: RateLimiter::new(config.server.rate_limit_per_minute),
            gate: ConcurrencyGate::new(config.server.max_concurrent_requests),
            cache: ResponseCache::new(
                config.server.cache_capacity,
                std::time::Duration::from_secs(config.server.cache_ttl_seconds),
            ),
            metrics: MetricsSink::new(),
            retrieval,
            backend,
            enable_cache: config.server.enable_cache,
            retrieval_default: config.retrieval.enabled,
        }
    }

    /// Run one request through the admission pipeline.
    ///
    /// Rate check, then a non-blocking gate acquire, then cache lookup; a
    /// miss runs retrieval (when enabled for the request) and delegates to
    /// the generation backend. Metrics are recorded exactly once on every
    /// path, and the gate slot is released on every path via the permit
    /// guard.
    #[inline]
    pub async fn handle(&self, request: &ChatRequest) -> Reply {
        let start = Instant::now();

        if !self.limiter.allow(&request.client_id) {
            self.metrics
                .record(start.elapsed(), RequestOutcome::RateLimited);
            return Reply::rejection(429, &GatewayError::RateLimited);
        }

        let Some(_permit) = self.gate.try_acquire() else {
            warn!(
                "Rejecting request from client {}: concurrency limit reached",
                request.client_id
            );
            self.metrics
                .record(start.elapsed(), RequestOutcome::ServerBusy);
            return Reply::rejection(503, &GatewayError::ServerBusy);
        };

        self.metrics.enter();
        let (reply, outcome) = self.process(request).await;
        self.metrics.exit();
        self.metrics.record(start.elapsed(), outcome);

        debug!(
            "Request from client {} finished in {:?} ({:?})",
            request.client_id,
            start.elapsed(),
            outcome
        );

        reply
    }

    async fn process(&self, request: &ChatRequest) -> (Reply, RequestOutcome) {
        let use_retrieval = request.use_retrieval.unwrap_or(self.retrieval_default);

        let cache_key = if self.enable_cache {
            let params = json!({
                "prompt": request.prompt,
                "format": request.format,
                "retrieval": use_retrieval,
            });
            let key = fingerprint("chat", &params);

            if let Some(payload) = self.cache.get(&key) {
                debug!("Cache hit for key: {}", key);
                return (Reply::ok(payload), RequestOutcome::CacheHit);
            }
            Some(key)
        } else {
            None
        };

        let outbound_prompt = if use_retrieval {
            self.enrich_prompt(&request.prompt)
        } else {
            request.prompt.clone()
        };

        match self.backend.complete(&outbound_prompt).await {
            Ok(response_text) => {
                let body = json!({
                    "response": response_text,
                    "format": request.format,
                    "content_type": request.format.content_type(),
                    "retrieval_used": use_retrieval,
                });

                // Only successful results are cached.
                if let Some(key) = cache_key {
                    self.cache.put(&key, body.clone());
                }

                (Reply::ok(body), RequestOutcome::CacheMiss)
            }
            Err(e) => {
                error!("Generation failed: {}", e);
                (Reply::rejection(500, &e), RequestOutcome::CacheMiss)
            }
        }
    }

    /// Prepend ranked knowledge-base context to the outbound prompt.
    fn enrich_prompt(&self, prompt: &str) -> String {
        let max_len = self.retrieval.config().max_context_length;
        let context = self.retrieval.context(prompt, max_len);

        if context.is_empty() {
            return prompt.to_string();
        }

        info!(
            "Retrieved {} characters of knowledge context",
            context.chars().count()
        );
        format!(
            "Relevant reference material:\n\n{}\n\n---\n\n{}",
            context, prompt
        )
    }

    /// Pass-through for the metrics read endpoint.
    #[inline]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Pass-through for the administrative cache-clear endpoint.
    #[inline]
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    #[inline]
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
