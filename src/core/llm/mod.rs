mod generator;
mod huggingface;

pub use generator::{ArticleGenerator, RetryPolicy};
pub use huggingface::{DEFAULT_MODEL_URL, HuggingFaceBackend};

#[cfg(test)]
pub(crate) use generator::tests::ScriptedBackend;

use async_trait::async_trait;
use serde::Serialize;

/// Sampling knobs sent with every completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub do_sample: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 500,
            temperature: 0.7,
            top_p: 0.9,
            do_sample: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The hosted model is still loading (HTTP 503).
    #[error("model is warming up")]
    WarmingUp,
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("backend returned an empty completion")]
    EmptyCompletion,
}

impl BackendError {
    pub fn is_warming_up(&self) -> bool {
        matches!(self, BackendError::WarmingUp)
    }
}

#[async_trait]
pub trait TextBackend: Send + Sync {
    fn name(&self) -> &str;

    // One request/response round trip; retries are the caller's business
    async fn complete(&self, prompt: &str, params: &SamplingParams)
    -> Result<String, BackendError>;
}
