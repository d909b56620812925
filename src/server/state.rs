//! Application state shared across all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::chat::ChatApp;
use crate::llm::LlmBackend;
use crate::ocr::TextExtractor;

/// Shared application state.
///
/// Message and image handlers hold the `app` lock from blocking tasks for the
/// whole interaction, model and OCR calls included. Async handlers only take
/// it briefly.
pub struct AppState {
    /// Sessions, settings, and selection.
    pub app: Mutex<ChatApp>,
    /// Backend serving completions.
    pub backend: Arc<dyn LlmBackend>,
    /// OCR engine.
    pub ocr: Arc<dyn TextExtractor>,
    /// Directory of the single-page UI.
    pub static_dir: PathBuf,
    /// Request body limit in bytes.
    pub max_body_bytes: usize,
}

impl AppState {
    /// Wrap the collaborators for sharing between handlers.
    #[must_use]
    pub fn new(
        app: ChatApp,
        backend: Arc<dyn LlmBackend>,
        ocr: Arc<dyn TextExtractor>,
        static_dir: impl Into<PathBuf>,
        max_body_bytes: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            app: Mutex::new(app),
            backend,
            ocr,
            static_dir: static_dir.into(),
            max_body_bytes,
        })
    }
}
