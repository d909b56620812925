//! Local backend for an Ollama server.
//!
//! Behaviour:
//! - Before every request, probe `GET /api/version`.
//! - If unreachable and autostart is enabled, spawn `ollama serve` and wait.
//! - Stream `POST /api/chat` and buffer the tokens into a single reply.

use std::io::{BufRead, BufReader};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle, sleep};
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::OllamaConfig;

use super::error::{LlmError, LlmResult};
use super::{ChatMessage, LlmBackend};

/// Startup wait settings.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(15);
const STARTUP_RETRY: Duration = Duration::from_millis(250);

/// Probe and connect timeout.
const IO_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// One NDJSON line of a streamed `/api/chat` response.
#[derive(Deserialize)]
struct StreamChunk {
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// Streaming Ollama client. Generation has no overall timeout.
pub struct OllamaBackend {
    client: Client,
    probe: Client,
    base_url: String,
    autostart: bool,
    binary: String,
}

impl OllamaBackend {
    /// Create a client for the configured server.
    ///
    /// # Errors
    /// Returns an error if the HTTP clients cannot be built.
    pub fn new(config: &OllamaConfig) -> LlmResult<Self> {
        let client = Client::builder()
            .connect_timeout(IO_TIMEOUT)
            .timeout(None::<Duration>)
            .build()?;
        let probe = Client::builder()
            .connect_timeout(IO_TIMEOUT)
            .timeout(IO_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            probe,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            autostart: config.autostart,
            binary: config.binary.clone(),
        })
    }

    /// Make sure the server answers, starting it when allowed.
    ///
    /// # Errors
    /// Returns an error if the server is down and cannot be started.
    pub fn ensure_available(&self) -> LlmResult<()> {
        let reason = match self.probe_version() {
            Ok(()) => return Ok(()),
            Err(reason) => reason,
        };

        if !self.autostart {
            return Err(LlmError::Unavailable {
                url: self.base_url.clone(),
                reason,
            });
        }

        info!(binary = %self.binary, "local model server down, starting it");
        let _reaper = spawn_ollama_serve(&self.binary)?;
        self.wait_until_ready()
    }

    fn probe_version(&self) -> Result<(), String> {
        let url = format!("{}/api/version", self.base_url);
        match self.probe.get(&url).send() {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(format!("status {}", response.status().as_u16())),
            Err(err) => Err(err.to_string()),
        }
    }

    fn wait_until_ready(&self) -> LlmResult<()> {
        let deadline = Instant::now() + STARTUP_TIMEOUT;

        while Instant::now() < deadline {
            if self.probe_version().is_ok() {
                return Ok(());
            }
            sleep(STARTUP_RETRY);
        }

        Err(LlmError::StartupTimeout)
    }
}

impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn complete(&self, messages: &[ChatMessage], model: &str) -> LlmResult<String> {
        self.ensure_available()?;

        let request = ChatRequest {
            model,
            messages,
            stream: true,
        };

        debug!(model, "streaming request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        collect_stream(BufReader::new(response))
    }
}

/// Buffer a streamed NDJSON chat response into one string.
fn collect_stream<R: BufRead>(reader: R) -> LlmResult<String> {
    let mut reply = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let chunk: StreamChunk =
            serde_json::from_str(line).map_err(|e| LlmError::Malformed(e.to_string()))?;

        if let Some(error) = chunk.error {
            return Err(LlmError::Backend(error));
        }
        if let Some(message) = chunk.message {
            reply.push_str(&message.content);
        }
        if chunk.done {
            break;
        }
    }

    Ok(reply)
}

/// Start `ollama serve` in the background.
///
/// The server outlives the caller. A detached thread waits on the child so it
/// is reaped whenever it exits; the handle yields that exit status.
fn spawn_ollama_serve(ollama_bin: &str) -> LlmResult<JoinHandle<Option<ExitStatus>>> {
    let mut child = Command::new(ollama_bin)
        .arg("serve")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let pid = child.id();
    debug!(pid, "ollama serve started");

    Ok(thread::spawn(move || {
        let status = child.wait().ok();
        debug!(pid, ?status, "ollama serve exited");
        status
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_stream_concatenates_tokens() {
        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"The \"},\"done\":false}\n",
            "\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"number is \"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"42.\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true,\"eval_count\":7}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"ignored\"},\"done\":false}\n",
        );
        assert_eq!(collect_stream(body.as_bytes()).unwrap(), "The number is 42.");
    }

    #[test]
    fn test_collect_stream_error_payload() {
        let body = "{\"error\":\"model 'nope' not found\"}\n";
        let err = collect_stream(body.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Model error: model 'nope' not found");
    }

    #[test]
    fn test_collect_stream_malformed_line() {
        let body = "{\"message\":{\"content\":\"a\"}}\nnot json\n";
        assert!(matches!(
            collect_stream(body.as_bytes()),
            Err(LlmError::Malformed(_))
        ));
    }

    #[test]
    fn test_unreachable_server_reported_per_call() {
        let config = OllamaConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..OllamaConfig::default()
        };
        let backend = OllamaBackend::new(&config).unwrap();

        for _ in 0..2 {
            let err = backend
                .complete(&[ChatMessage::user("hi")], "mistral:7b-instruct-q8_0")
                .unwrap_err();
            assert!(matches!(err, LlmError::Unavailable { .. }));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_spawned_server_is_reaped() {
        let reaper = spawn_ollama_serve("true").unwrap();
        let status = reaper.join().unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    #[test]
    fn test_spawn_missing_binary() {
        assert!(matches!(
            spawn_ollama_serve("/nonexistent/ollama"),
            Err(LlmError::Io(_))
        ));
    }
}
