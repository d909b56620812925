//! Startup helpers for the chat server.
//!
//! Everything that builds blocking HTTP clients happens before the tokio
//! runtime exists.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

use crate::chat::{ChatApp, SessionStore, Settings};
use crate::config::AppConfig;
use crate::llm::build_backend;
use crate::ocr::TesseractCli;
use crate::server::{self, AppState};

/// Run the server until Ctrl-C.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting vision chat v{}", env!("CARGO_PKG_VERSION"));

    let (config, state) = match initialize() {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!("Failed to start: {e:#}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::serve(state, config.port, shutdown_signal())) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Resolve configuration and build the application state without serving.
///
/// # Errors
/// Returns an error if configuration is invalid or a collaborator cannot be built.
pub fn initialize() -> anyhow::Result<(AppConfig, Arc<AppState>)> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        backend = %config.backend,
        data_file = %config.data_file.display(),
        static_dir = %config.static_dir.display(),
        "configuration loaded"
    );

    let backend = build_backend(&config).context("failed to build LLM backend")?;
    if let Some(warning) = backend.warning() {
        tracing::warn!("{warning}");
    }

    let settings = Settings::new(config.backend)
        .with_language(&config.ocr.default_language)
        .context("invalid OCR language")?;
    let app = ChatApp::new(SessionStore::new(&config.data_file), settings);
    let ocr = Arc::new(TesseractCli::new(&config.ocr.tesseract_bin));

    let state = AppState::new(
        app,
        backend,
        ocr,
        &config.static_dir,
        config.max_upload_bytes,
    );
    Ok((config, state))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
