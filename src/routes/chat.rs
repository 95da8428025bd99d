use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    state::SharedState,
};

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected chat request body");
        AppError::from(rejection)
    })?;

    let response = state
        .model
        .generate(&payload.user_message)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Model call failed");
            AppError::Generation(e)
        })?;

    Ok(Json(ChatResponse { response }))
}
