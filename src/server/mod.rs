//! HTTP front for the chat: JSON API under `/api` plus the static UI.

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Router with CORS and request tracing applied.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve on every interface at `port` until `shutdown` resolves.
///
/// # Errors
/// Returns an error if the port cannot be bound or serving fails.
pub async fn serve<F>(state: Arc<AppState>, port: u16, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "vision chat listening");

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown)
        .await
}
