use crate::{rag::IndexStatus, types::Result, AppState};
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// Health check
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.pipeline.model_name(),
        "sessions": state.sessions.len(),
    }))
}

/// Knowledge index status
pub async fn index_status(State(state): State<AppState>) -> Result<Json<IndexStatus>> {
    Ok(Json(state.index.status().await?))
}
