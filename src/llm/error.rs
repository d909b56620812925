//! Error types for the LLM backends.
//!
//! The display text of every variant is what ends up in the conversation
//! when a call fails, so it is written for the user.

use thiserror::Error;

/// LLM backend error type.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The cloud backend has no API key configured.
    #[error(
        "Please add GROQ_API_KEY to your configuration. Get a free API key from https://console.groq.com"
    )]
    MissingApiKey,
    /// The local model server did not answer its readiness probe.
    #[error("Local model server is not reachable at {url}: {reason}")]
    Unavailable {
        /// Base URL that was probed.
        url: String,
        /// Probe failure.
        reason: String,
    },
    /// The local model server was started but never became ready.
    #[error("Local model server did not become ready in time")]
    StartupTimeout,
    /// Transport-level failure.
    #[error("Error calling API: {0}")]
    Request(#[from] reqwest::Error),
    /// Non-success HTTP status.
    #[error("API Error: {status} - {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body as text.
        body: String,
    },
    /// The backend answered with an error payload.
    #[error("Model error: {0}")]
    Backend(String),
    /// The response could not be parsed.
    #[error("Malformed response from model: {0}")]
    Malformed(String),
    /// Reading the response stream or spawning the server failed.
    #[error("I/O error talking to model: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for LLM calls.
pub type LlmResult<T> = Result<T, LlmError>;
