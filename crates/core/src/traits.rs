use async_trait::async_trait;

use crate::error::ServiceError;
use crate::types::{CleanedFrame, FrameObservation};

/// Request to a completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from a completion provider.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// A chat-completion backend (OpenAI-compatible endpoint, mock, ...).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name (e.g., "openai", "deepseek").
    fn name(&self) -> &str;

    /// Send one completion request and return the raw completion text.
    async fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResponse, ServiceError>;
}

/// A frame-cleaning backend: LLM-based or rule-based.
///
/// The pipeline driver is agnostic to which backend is in use, so the two
/// can be run over the same input and compared. Parse problems never
/// surface as errors; they come back as `parse_failed` records. Only
/// service-boundary failures escape.
#[async_trait]
pub trait FrameCleaner: Send + Sync {
    /// Backend name for logs and the run summary.
    fn name(&self) -> &str;

    /// Clean one raw observation into a structured record.
    async fn clean(&self, frame: &FrameObservation) -> Result<CleanedFrame, ServiceError>;
}
