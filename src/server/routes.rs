//! HTTP route handlers for the chat API.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Local;
use serde::Deserialize;
use tower_http::services::ServeDir;

use crate::chat::{
    ChatError, ChatResult, ImageAction, Outcome, SessionId, SessionView, Settings, StateView,
    validate_image,
};
use crate::ocr::decode_image_payload;

use super::state::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/state", get(app_state))
        .route("/api/settings", put(update_settings))
        .route("/api/sessions", post(new_chat))
        .route("/api/sessions/{id}", get(get_session).delete(delete_chat))
        .route("/api/sessions/{id}/select", post(select_chat))
        .route("/api/sessions/{id}/messages", post(send_message))
        .route("/api/sessions/{id}/images", post(upload_image))
        .fallback_service(static_files)
        .layer(body_limit)
        .with_state(state)
}

/// Map a chat error onto an HTTP status.
fn error_response(err: ChatError) -> (StatusCode, String) {
    let status = match &err {
        ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Run `work` on the blocking pool. Model, OCR, and file I/O all block.
///
/// Work that touches the chat takes `blocking_lock` once and keeps the guard
/// until it returns, so interactions never interleave.
async fn blocking<T, F>(state: Arc<AppState>, work: F) -> ApiResult<T>
where
    F: FnOnce(&AppState) -> ChatResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || work(state.as_ref()))
        .await
        .map_err(|e| error_response(ChatError::Internal(e.to_string())))?
        .map(Json)
        .map_err(error_response)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "vision-chat",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Sidebar, settings, and selection.
async fn app_state(State(state): State<Arc<AppState>>) -> Json<StateView> {
    let warning = state.backend.warning();
    let app = state.app.lock().await;
    Json(app.state_view(Local::now().date_naive(), warning))
}

/// Settings update request; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsRequest {
    /// New model id.
    pub model: Option<String>,
    /// New OCR language code.
    pub ocr_language: Option<String>,
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> ApiResult<Settings> {
    let mut app = state.app.lock().await;
    app.update_settings(request.model.as_deref(), request.ocr_language.as_deref())
        .map(Json)
        .map_err(error_response)
}

async fn new_chat(State(state): State<Arc<AppState>>) -> ApiResult<Outcome<SessionView>> {
    blocking(state, |state| {
        Ok(state.app.blocking_lock().new_chat(Local::now()))
    })
    .await
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SessionView> {
    let app = state.app.lock().await;
    app.session(&SessionId::from(id))
        .map(|session| Json(SessionView::from(session)))
        .map_err(error_response)
}

async fn select_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SessionView> {
    let mut app = state.app.lock().await;
    app.select_chat(&SessionId::from(id))
        .map(Json)
        .map_err(error_response)
}

async fn delete_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Outcome<()>> {
    let id = SessionId::from(id);
    blocking(state, move |state| state.app.blocking_lock().delete_chat(&id)).await
}

/// Typed message.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// User input.
    pub content: String,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<Outcome<SessionView>> {
    let id = SessionId::from(id);
    blocking(state, move |state| {
        let mut app = state.app.blocking_lock();
        app.send_message(&id, &request.content, state.backend.as_ref())
    })
    .await
}

/// Uploaded image and the action to take.
#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    /// Base64 image bytes, optionally as a `data:` URL.
    pub image: String,
    /// Extract, analyze, or save.
    #[serde(default)]
    pub action: ImageAction,
}

async fn upload_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ImageRequest>,
) -> ApiResult<Outcome<SessionView>> {
    let id = SessionId::from(id);
    let image = decode_image_payload(&request.image)
        .map_err(|e| error_response(ChatError::InvalidImage(e.to_string())))?;
    validate_image(&image).map_err(error_response)?;
    let action = request.action;

    blocking(state, move |state| {
        let mut app = state.app.blocking_lock();
        app.upload_image(
            &id,
            &image,
            action,
            state.ocr.as_ref(),
            state.backend.as_ref(),
        )
    })
    .await
}
