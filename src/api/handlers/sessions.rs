use crate::{
    types::{ChatRequest, ChatResponse, Result, SessionCreated, SessionHistory},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// Start a chat session
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.sessions.create();
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

/// Full message history of a session
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionHistory>> {
    let session = state.sessions.get(&id)?;
    let session = session.lock().await;

    Ok(Json(SessionHistory {
        session_id: id,
        messages: session.messages().to_vec(),
    }))
}

/// Send a message and wait for the assistant's reply
///
/// Turns on the same session are serialized by the session lock. If
/// generation fails the error is returned and the history is unchanged.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let session = state.sessions.get(&id)?;
    let mut session = session.lock().await;

    let answer = session.turn(&state.pipeline, &payload.message).await?;

    Ok(Json(ChatResponse {
        response: answer.text,
        used_context: answer.used_context,
        sources: answer.sources,
        history_len: session.len(),
    }))
}

/// End a session and discard its history
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.sessions.end(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
