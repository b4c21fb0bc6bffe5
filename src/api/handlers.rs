use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use std::sync::Arc;

use super::routes::AppState;
use super::{
    DeleteResponse, HealthResponse, LanguageInfo, LanguagesResponse, SpeechRequest,
    UploadResponse, VoiceReferencesResponse, MAX_INPUT_CHARS,
};
use crate::audio;
use crate::emotion::EMOTION_NAMES;
use crate::engine::{self, SynthesisParams};
use crate::error::AppError;

pub async fn generate_speech(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpeechRequest>,
) -> Result<Response, AppError> {
    if request.input.is_empty() {
        return Err(AppError::BadRequest("Input text cannot be empty".into()));
    }

    if request.input.len() > MAX_INPUT_CHARS {
        return Err(AppError::BadRequest(format!(
            "Input text too long (max {} chars)",
            MAX_INPUT_CHARS
        )));
    }

    tracing::info!(
        "Generating speech: language={:?}, voice_reference={:?}, speed={}, text_len={}",
        request.language,
        request.voice_reference,
        request.speed(),
        request.input.len()
    );

    let params = SynthesisParams {
        text: request.input.clone(),
        language: request.language.clone(),
        speaker_prompt: resolve_prompt(&state, request.voice_reference.as_deref()),
        emotion: request.emotion_vector(),
        temperature: request.temperature(),
    };

    let speed = request.speed();
    let target_rate = request.sample_rate;
    let worker_state = Arc::clone(&state);

    // Synthesis is a long-running CPU/GPU-bound call; keep it off the
    // async executor.
    let wav = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, AppError> {
        let engines = if worker_state.degrade_to_placeholder {
            worker_state.registry.ensure_loaded_or_placeholder()
        } else {
            worker_state.registry.ensure_loaded()?
        };

        let buffer = engine::dispatch(&engines, &params)?;
        let buffer = audio::postprocess(buffer, speed, target_rate)?;
        tracing::info!(
            "Speech generated: {:.2}s at {} Hz",
            buffer.duration_secs(),
            buffer.sample_rate
        );
        audio::encode_wav(&buffer)
    })
    .await
    .map_err(|e| AppError::SynthesisError(format!("Synthesis task failed: {}", e)))??;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=speech.wav",
            ),
        ],
        wav,
    )
        .into_response())
}

/// Resolve a requested voice reference to an existing path: as given, then
/// inside the store, then the configured default prompt.
fn resolve_prompt(state: &AppState, requested: Option<&str>) -> Option<PathBuf> {
    if let Some(raw) = requested {
        let direct = PathBuf::from(raw);
        if direct.exists() {
            return Some(direct);
        }
        let stored = state.store.resolve(raw);
        if stored.exists() {
            return Some(stored);
        }
        tracing::warn!("Voice reference not found: {}", raw);
    }

    if let Some(default) = &state.default_voice {
        if default.exists() {
            if requested.is_some() {
                tracing::warn!("Falling back to default voice reference");
            }
            return Some(default.clone());
        }
    }

    None
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let engines = state.registry.loaded();
    let status = if state.registry.is_placeholder() {
        "degraded"
    } else if engines.is_some() {
        "healthy"
    } else {
        "initializing"
    };

    Json(HealthResponse {
        status: status.to_string(),
        device: engines.as_ref().map(|e| e.device.to_string()),
        model_loaded: engines.is_some(),
    })
}

pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.metadata.clone())
}

pub async fn list_voice_references(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VoiceReferencesResponse>, AppError> {
    let voice_references = state.store.list()?;
    Ok(Json(VoiceReferencesResponse {
        count: voice_references.len(),
        directory: state.store.directory().to_string_lossy().to_string(),
        voice_references,
    }))
}

pub async fn upload_voice_reference(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::UploadError(format!("Invalid multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::UploadError(format!("Failed to read upload: {}", e)))?;

        let reference = state.store.upload(&filename, &bytes)?;
        return Ok(Json(UploadResponse {
            filename: reference.filename,
            path: reference.path,
            size_bytes: reference.size_bytes,
            message: "Voice reference uploaded successfully".to_string(),
        }));
    }

    Err(AppError::UploadError(
        "No file field found in multipart body".to_string(),
    ))
}

pub async fn delete_voice_reference(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let filename = state.store.delete(&filename)?;
    Ok(Json(DeleteResponse {
        filename,
        message: "Voice reference deleted successfully".to_string(),
    }))
}

pub async fn list_languages() -> Json<LanguagesResponse> {
    let languages = [
        ("en", "English"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
        ("it", "Italian"),
        ("pt", "Portuguese"),
        ("pl", "Polish"),
        ("tr", "Turkish"),
        ("ru", "Russian"),
        ("nl", "Dutch"),
        ("cs", "Czech"),
        ("ar", "Arabic"),
        ("zh", "Chinese"),
        ("ja", "Japanese"),
        ("hu", "Hungarian"),
        ("ko", "Korean"),
        ("hi", "Hindi"),
        ("uk", "Ukrainian"),
        ("vi", "Vietnamese"),
        ("th", "Thai"),
        ("id", "Indonesian"),
        ("ro", "Romanian"),
        ("sv", "Swedish"),
    ];

    Json(LanguagesResponse {
        languages: languages
            .iter()
            .map(|(code, name)| LanguageInfo {
                code: code.to_string(),
                name: name.to_string(),
            })
            .collect(),
    })
}

pub async fn list_emotions() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "emotions": EMOTION_NAMES }))
}

pub async fn list_models() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "models": [
            {
                "id": "index-tts-base",
                "name": "Index TTS Base Model",
                "languages": ["en"],
                "emotions": EMOTION_NAMES,
            }
        ]
    }))
}
