use async_trait::async_trait;

/// Request to an LLM provider. One-shot: a system prompt, a user prompt, a
/// token cap. The scheduler has no use for multi-turn history.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// Common interface for all LLM providers (Anthropic, OpenAI-compatible).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Send a completion request, wait for the full response text.
    async fn complete(&self, req: &CompletionRequest) -> Result<String, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Request deadline of {secs}s elapsed")]
    DeadlineElapsed { secs: u64 },
}
