//! Error types for the chat subsystem.

use std::path::PathBuf;

use thiserror::Error;

use super::types::SessionId;

/// Failure to persist the session collection.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing or renaming the history file failed.
    #[error("could not write {path}: {source}")]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The collection could not be serialized.
    #[error("could not serialize chats: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by the interaction handlers.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No session with this id.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    /// The user submitted an empty message.
    #[error("message is empty")]
    EmptyInput,
    /// A settings value outside the enumerated choices.
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
    /// The uploaded payload is not a decodable image.
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// A blocking task could not be joined.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Whether the error was caused by the request rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::InvalidSetting(_) | Self::InvalidImage(_)
        )
    }
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;
