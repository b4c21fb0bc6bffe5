use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Voice reference not found: {0}")]
    VoiceReferenceNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Engine error: {0}")]
    EngineError(String),

    #[error("Synthesis failed: {0}")]
    SynthesisError(String),

    #[error("Audio processing failed: {0}")]
    AudioError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Upload error: {0}")]
    UploadError(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::VoiceReferenceNotFound(name) => (
                StatusCode::NOT_FOUND,
                "VOICE_REFERENCE_NOT_FOUND",
                format!("Voice reference '{}' not found", name),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::EngineError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ENGINE_ERROR",
                msg.clone(),
            ),
            AppError::SynthesisError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SYNTHESIS_ERROR",
                msg.clone(),
            ),
            AppError::AudioError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUDIO_ERROR",
                msg.clone(),
            ),
            AppError::IoError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                e.to_string(),
            ),
            AppError::JsonError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "JSON_ERROR",
                e.to_string(),
            ),
            AppError::UploadError(msg) => (StatusCode::BAD_REQUEST, "UPLOAD_ERROR", msg.clone()),
        };

        tracing::error!("Request failed: {} - {}", code, message);

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}
