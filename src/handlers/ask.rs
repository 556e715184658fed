//! Assistant handlers.

use crate::error::AppError;
use crate::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Answer a statistics question through the tool-calling assistant.
pub async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    tracing::info!(
        question_len = payload.question.len(),
        "Assistant question received"
    );

    let answer = state.assistant.ask(&payload.question).await?;
    Ok(Json(AskResponse { answer }))
}
