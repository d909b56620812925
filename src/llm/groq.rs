//! Cloud backend: one blocking call to an OpenAI-compatible chat endpoint.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GroqConfig;

use super::error::{LlmError, LlmResult};
use super::{ChatMessage, LlmBackend};

/// Connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Groq chat-completions client with a bounded request timeout.
pub struct GroqBackend {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl GroqBackend {
    /// Create a client from configuration.
    ///
    /// A missing API key is not an error here; every call reports it instead.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GroqConfig) -> LlmResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

impl LlmBackend for GroqBackend {
    fn name(&self) -> &str {
        "groq"
    }

    fn complete(&self, messages: &[ChatMessage], model: &str) -> LlmResult<String> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let body = CompletionRequest {
            model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model, "sending request to Groq");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_completion(&text)
    }

    fn warning(&self) -> Option<String> {
        self.api_key
            .is_none()
            .then(|| LlmError::MissingApiKey.to_string())
    }
}

/// Extract the first choice's content from a completion response body.
fn parse_completion(body: &str) -> LlmResult<String> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Malformed(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(LlmError::Backend(error.message));
    }

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| LlmError::Malformed("no choices in response".to_string()))
}
