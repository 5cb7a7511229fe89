use crate::api::handlers::{index, sessions};
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Routes mounted under `/api`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(index::health))
        .route("/index", get(index::index_status))
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::end_session),
        )
        .route("/sessions/{id}/messages", post(sessions::send_message))
}
