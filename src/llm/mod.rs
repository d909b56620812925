//! LLM backends behind one capability trait.
//!
//! - `GroqBackend`: single blocking call to an OpenAI-compatible cloud API.
//! - `OllamaBackend`: local server, token stream buffered into one string.
//!
//! Both are blocking; async callers run them on the blocking pool.

pub mod error;
pub mod groq;
pub mod ollama;

pub use error::{LlmError, LlmResult};
pub use groq::GroqBackend;
pub use ollama::OllamaBackend;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chat::types::Role;
use crate::config::AppConfig;

/// Models offered for the cloud backend; the first is the default.
pub const CLOUD_MODELS: &[&str] = &[
    "llama-3.1-8b-instant",
    "llama-3.1-70b-versatile",
    "mixtral-8x7b-32768",
    "gemma2-9b-it",
];

/// Models offered for the local backend; the first is the default.
pub const LOCAL_MODELS: &[&str] = &[
    "mistral:7b-instruct-q8_0",
    "ministral-3:8b-instruct-2512-q8_0",
    "llama3.1:8b",
];

/// One role-tagged message of an outbound request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role.
    pub role: Role,
    /// Text content.
    pub content: String,
}

impl ChatMessage {
    /// User message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Which backend implementation serves completions.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hosted OpenAI-compatible API.
    #[default]
    Cloud,
    /// Locally hosted Ollama server.
    Local,
}

impl BackendKind {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Local => "local",
        }
    }

    /// Enumerated model ids for this backend.
    #[must_use]
    pub const fn models(self) -> &'static [&'static str] {
        match self {
            Self::Cloud => CLOUD_MODELS,
            Self::Local => LOCAL_MODELS,
        }
    }

    /// Default model id for this backend.
    #[must_use]
    pub fn default_model(self) -> &'static str {
        self.models().first().copied().unwrap_or_default()
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cloud" | "groq" => Ok(Self::Cloud),
            "local" | "ollama" => Ok(Self::Local),
            _ => Err(value.to_string()),
        }
    }
}

/// A chat-completion capability.
pub trait LlmBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Send `messages` to `model` and return the whole reply.
    ///
    /// # Errors
    /// Returns an error if the backend is unreachable, rejects the request,
    /// or answers with an error payload.
    fn complete(&self, messages: &[ChatMessage], model: &str) -> LlmResult<String>;

    /// Configuration problem worth showing in the settings panel.
    fn warning(&self) -> Option<String> {
        None
    }
}

/// Call the backend, turning any failure into reply text.
#[must_use]
pub fn reply_or_error(backend: &dyn LlmBackend, messages: &[ChatMessage], model: &str) -> String {
    debug!(backend = backend.name(), model, count = messages.len(), "sending completion request");
    match backend.complete(messages, model) {
        Ok(reply) => reply,
        Err(err) => {
            warn!(backend = backend.name(), model, error = %err, "completion failed");
            format!("⚠️ {err}")
        }
    }
}

/// Build the backend selected by configuration.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built.
pub fn build_backend(config: &AppConfig) -> LlmResult<Arc<dyn LlmBackend>> {
    Ok(match config.backend {
        BackendKind::Cloud => Arc::new(GroqBackend::new(&config.groq)?),
        BackendKind::Local => Arc::new(OllamaBackend::new(&config.ollama)?),
    })
}
