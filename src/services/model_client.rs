// src/services/model_client.rs
use async_trait::async_trait;
use thiserror::Error;

/// Failures of the remote text model, either while constructing the
/// client or while serving a single `generate` call.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model client not configured: {0}")]
    NotConfigured(String),

    #[error("failed to initialize model client: {0}")]
    Init(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response from model: {0}")]
    InvalidResponse(String),

    #[error("response blocked: {0}")]
    Blocked(String),

    #[error("model returned no text")]
    EmptyResponse,
}

/// A handle to a generative text model.
///
/// Implementations hold no per-request state and are shared read-only
/// between concurrent requests.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send `prompt` to the model and return its completion.
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}
