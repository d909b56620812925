//! Runtime configuration resolved from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::chat::store::DEFAULT_DATA_FILE;
use crate::llm::BackendKind;
use crate::ocr::OCR_LANGUAGES;

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Environment variable names.
pub mod env {
    /// HTTP port.
    pub const PORT: &str = "VISION_CHAT_PORT";
    /// Chat history file.
    pub const DATA_FILE: &str = "VISION_CHAT_DATA_FILE";
    /// Directory holding the single-page UI.
    pub const STATIC_DIR: &str = "VISION_CHAT_STATIC_DIR";
    /// `cloud` or `local`.
    pub const BACKEND: &str = "VISION_CHAT_BACKEND";
    /// Cloud API key.
    pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
    /// Cloud API base URL.
    pub const GROQ_URL: &str = "VISION_CHAT_GROQ_URL";
    /// Cloud request timeout in seconds.
    pub const GROQ_TIMEOUT_SECS: &str = "VISION_CHAT_GROQ_TIMEOUT_SECS";
    /// Local Ollama base URL.
    pub const OLLAMA_URL: &str = "VISION_CHAT_OLLAMA_URL";
    /// Start `ollama serve` when the local server is down.
    pub const OLLAMA_AUTOSTART: &str = "VISION_CHAT_OLLAMA_AUTOSTART";
    /// Ollama binary.
    pub const OLLAMA_BIN: &str = "VISION_CHAT_OLLAMA_BIN";
    /// Tesseract binary.
    pub const TESSERACT_BIN: &str = "VISION_CHAT_TESSERACT_BIN";
    /// Default OCR language code.
    pub const OCR_LANGUAGE: &str = "VISION_CHAT_OCR_LANGUAGE";
    /// Upload size limit in megabytes.
    pub const MAX_UPLOAD_MB: &str = "VISION_CHAT_MAX_UPLOAD_MB";
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value could not be parsed or is out of range.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// A URL setting is not a valid URL.
    #[error("invalid url for {key}: {source}")]
    Url {
        /// Variable name.
        key: &'static str,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
}

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize)]
pub struct AppConfig {
    /// HTTP port.
    pub port: u16,
    /// Chat history file.
    pub data_file: PathBuf,
    /// Directory served at `/`.
    pub static_dir: PathBuf,
    /// Selected backend implementation.
    pub backend: BackendKind,
    /// Cloud backend settings.
    pub groq: GroqConfig,
    /// Local backend settings.
    pub ollama: OllamaConfig,
    /// OCR settings.
    pub ocr: OcrConfig,
    /// Maximum accepted request body in bytes.
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            static_dir: PathBuf::from("static"),
            backend: BackendKind::Cloud,
            groq: GroqConfig::default(),
            ollama: OllamaConfig::default(),
            ocr: OcrConfig::default(),
            max_upload_bytes: 20 * 1024 * 1024, // 20 MB
        }
    }
}

/// Cloud (Groq, OpenAI-compatible) backend settings.
#[derive(Clone, Debug, Serialize)]
pub struct GroqConfig {
    /// API key; the backend reports an inline warning when absent.
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token budget.
    pub max_tokens: u32,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            timeout: Duration::from_secs(30),
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

/// Local Ollama backend settings.
#[derive(Clone, Debug, Serialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama API.
    pub base_url: String,
    /// Whether to spawn `ollama serve` when the server is down.
    pub autostart: bool,
    /// Binary used for autostart.
    pub binary: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            autostart: false,
            binary: "ollama".to_string(),
        }
    }
}

/// OCR settings.
#[derive(Clone, Debug, Serialize)]
pub struct OcrConfig {
    /// Tesseract binary.
    pub tesseract_bin: String,
    /// Language selected at startup.
    pub default_language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_bin: "tesseract".to_string(),
            default_language: "eng".to_string(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns an error if a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(port) = get(env::PORT) {
            config.port = parse(env::PORT, &port)?;
        }
        if let Some(path) = get(env::DATA_FILE) {
            config.data_file = PathBuf::from(path);
        }
        if let Some(dir) = get(env::STATIC_DIR) {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(backend) = get(env::BACKEND) {
            config.backend = backend.parse().map_err(|value| ConfigError::Invalid {
                key: env::BACKEND,
                reason: format!("unknown backend {value:?}, expected cloud or local"),
            })?;
        }

        config.groq.api_key = get(env::GROQ_API_KEY);
        if let Some(url) = get(env::GROQ_URL) {
            config.groq.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = get(env::GROQ_TIMEOUT_SECS) {
            config.groq.timeout = Duration::from_secs(parse(env::GROQ_TIMEOUT_SECS, &secs)?);
        }

        if let Some(url) = get(env::OLLAMA_URL) {
            config.ollama.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(flag) = get(env::OLLAMA_AUTOSTART) {
            config.ollama.autostart = parse_bool(env::OLLAMA_AUTOSTART, &flag)?;
        }
        if let Some(bin) = get(env::OLLAMA_BIN) {
            config.ollama.binary = bin;
        }

        if let Some(bin) = get(env::TESSERACT_BIN) {
            config.ocr.tesseract_bin = bin;
        }
        if let Some(lang) = get(env::OCR_LANGUAGE) {
            config.ocr.default_language = lang;
        }
        if let Some(mb) = get(env::MAX_UPLOAD_MB) {
            let mb: usize = parse(env::MAX_UPLOAD_MB, &mb)?;
            config.max_upload_bytes = mb.saturating_mul(1024 * 1024);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                key: env::PORT,
                reason: "must be > 0".to_string(),
            });
        }

        if self.groq.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: env::GROQ_TIMEOUT_SECS,
                reason: "must be > 0".to_string(),
            });
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: env::MAX_UPLOAD_MB,
                reason: "must be > 0".to_string(),
            });
        }

        if !OCR_LANGUAGES.contains(&self.ocr.default_language.as_str()) {
            return Err(ConfigError::Invalid {
                key: env::OCR_LANGUAGE,
                reason: format!("expected one of {}", OCR_LANGUAGES.join(", ")),
            });
        }

        Url::parse(&self.groq.base_url).map_err(|source| ConfigError::Url {
            key: env::GROQ_URL,
            source,
        })?;
        Url::parse(&self.ollama.base_url).map_err(|source| ConfigError::Url {
            key: env::OLLAMA_URL,
            source,
        })?;

        Ok(())
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got {raw:?}"),
        }),
    }
}
