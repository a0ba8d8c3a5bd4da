use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Server busy, concurrency limit reached")]
    ServerBusy,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl GatewayError {
    /// Stable machine-readable code carried in error response bodies.
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::RateLimited => "RATE_LIMIT_EXCEEDED",
            GatewayError::ServerBusy => "SERVER_BUSY",
            GatewayError::Generation(_) => "UPSTREAM_ERROR",
            GatewayError::Config(_) => "CONFIG_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

pub mod admission;
pub mod cache;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod gateway;
pub mod generation;
pub mod knowledge;
pub mod metrics;
