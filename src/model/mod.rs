//! Remote text-generation clients.
//!
//! The dispatcher only sees the [`ModelClient`] trait. [`GeminiClient`] is the
//! production implementation; tests substitute their own.

mod gemini;
mod retry;

pub use gemini::{parse_reply, GeminiClient};
pub use retry::RetryPolicy;

/// Reply from a model call: generated text or a failure description.
pub type ModelReply = Result<String, ModelError>;

/// A blocking request/response text-generation service.
pub trait ModelClient {
    /// Send a fully rendered prompt and wait for the reply.
    fn generate(&self, prompt: &str) -> ModelReply;
}

impl<T: ModelClient + ?Sized> ModelClient for &T {
    fn generate(&self, prompt: &str) -> ModelReply {
        (**self).generate(prompt)
    }
}

impl<T: ModelClient + ?Sized> ModelClient for Box<T> {
    fn generate(&self, prompt: &str) -> ModelReply {
        (**self).generate(prompt)
    }
}

/// Error type for model calls.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// No API key was supplied at startup.
    #[error("No API key configured. Set GEMINI_API_KEY or pass --api-key.")]
    MissingApiKey,
    /// Transport-level failure (connection refused, DNS, TLS, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The request exceeded its timeout.
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },
    /// The service refused to answer the prompt.
    #[error("Prompt blocked: {0}")]
    Blocked(String),
    /// The reply contained no text.
    #[error("Model returned an empty reply")]
    EmptyReply,
    /// The response body could not be decoded.
    #[error("Invalid API response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl ModelError {
    /// Whether a later attempt might succeed.
    ///
    /// Transport failures, timeouts, rate limiting and server errors are
    /// transient; everything else is a property of the request itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Http(e) => !e.is_builder() && !e.is_decode(),
            ModelError::Timeout(_) => true,
            ModelError::Status { status, .. } => *status == 429 || *status >= 500,
            ModelError::MissingApiKey
            | ModelError::Blocked(_)
            | ModelError::EmptyReply
            | ModelError::InvalidResponse(_) => false,
        }
    }
}
