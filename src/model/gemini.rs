//! Blocking client for the Gemini `generateContent` REST endpoint.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use super::{ModelClient, ModelError, ModelReply, RetryPolicy};
use crate::config::AgentConfig;

/// Gemini API client.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
    retry: RetryPolicy,
    interrupted: Option<Arc<AtomicBool>>,
}

impl GeminiClient {
    /// Create a client for the model and endpoint in `config`.
    ///
    /// The key is passed in explicitly; it is never read from source or disk here.
    /// Without a key every [`generate`](ModelClient::generate) call fails with
    /// [`ModelError::MissingApiKey`] before touching the network.
    pub fn new(api_key: Option<String>, config: &AgentConfig) -> Result<Self, ModelError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .user_agent(format!("sway/{}", crate::VERSION))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: endpoint_url(&config.api_base, &config.model),
            timeout,
            retry: RetryPolicy::from_config(&config.retry),
            interrupted: None,
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Abandon pending retries once `flag` is set.
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(flag);
        self
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn attempt(&self, api_key: &str, prompt: &str, attempt: u32) -> ModelReply {
        tracing::debug!(endpoint = %self.endpoint, attempt, prompt_len = prompt.len(), "sending prompt");

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        parse_reply(&text)
    }

    fn classify(&self, e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout(self.timeout.as_secs())
        } else {
            ModelError::Http(e)
        }
    }
}

impl ModelClient for GeminiClient {
    fn generate(&self, prompt: &str) -> ModelReply {
        let api_key = self.api_key.as_deref().ok_or(ModelError::MissingApiKey)?;
        let op = |attempt: u32| self.attempt(api_key, prompt, attempt);
        match &self.interrupted {
            Some(flag) => self.retry.run_interruptible(op, flag),
            None => self.retry.run(op),
        }
    }
}

fn endpoint_url(api_base: &str, model: &str) -> String {
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!(
        "{}/models/{}:generateContent",
        api_base.trim_end_matches('/'),
        model
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extract the reply text from a successful response body.
///
/// Text parts of the first candidate are concatenated.
pub fn parse_reply(body: &str) -> ModelReply {
    let response: GenerateContentResponse = serde_json::from_str(body)?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|f| f.block_reason)
    {
        return Err(ModelError::Blocked(reason));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ModelError::EmptyReply);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(text);
    }

    match candidate.finish_reason {
        Some(reason) if reason != "STOP" => Err(ModelError::Blocked(reason)),
        _ => Err(ModelError::EmptyReply),
    }
}

/// Best-effort message from an error response body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
