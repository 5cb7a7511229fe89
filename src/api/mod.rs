//! HTTP API Handlers and Routes
//!
//! # API Endpoints
//!
//! - `GET /api/health` - health check
//! - `GET /api/index` - knowledge index status
//! - `POST /api/sessions` - start a chat session
//! - `GET /api/sessions/{id}` - session history
//! - `POST /api/sessions/{id}/messages` - send a message, get the reply
//! - `DELETE /api/sessions/{id}` - end a session
//!
//! Every other path is served from the embedded chat page.

/// Embedded static UI.
pub mod assets;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::AppState;
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

const MAX_BODY_BYTES: usize = 256 * 1024;

/// The complete application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::create_router())
        .fallback(assets::serve_asset)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState) -> crate::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| crate::AppError::Configuration(format!("Cannot bind {}: {}", addr, e)))?;

    tracing::info!("Chat UI listening on http://{}", addr);

    let cleanup = state.sessions.start_cleanup_task();

    let result = axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| crate::AppError::Internal(format!("Server error: {}", e)));

    if let Some(task) = cleanup {
        task.abort();
    }
    result
}
