use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(#[from] LlmError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Malformed LLM response: {0}")]
    MalformedLlmResponse(String),

    #[error("Scoring unavailable: {0}")]
    ScoringUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ModelInvocation(e) => {
                tracing::error!("Model invocation error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MODEL_INVOCATION_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Embedding(e) => {
                tracing::error!("Embedding error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EMBEDDING_ERROR",
                    "Failed to compute embedding similarity".to_string(),
                )
            }
            AppError::MalformedLlmResponse(msg) => {
                tracing::error!("Malformed LLM response: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MALFORMED_LLM_RESPONSE",
                    "The AI model returned an incomplete evaluation".to_string(),
                )
            }
            AppError::ScoringUnavailable(msg) => {
                tracing::error!("Scoring unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SCORING_UNAVAILABLE",
                    "Scoring is currently unavailable".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
