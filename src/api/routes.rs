use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{delete, get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::engine::ModelRegistry;
use crate::voices::VoiceStore;

pub struct AppState {
    pub registry: ModelRegistry,
    pub store: VoiceStore,
    /// Served verbatim by `GET /`.
    pub metadata: serde_json::Value,
    /// Fallback cloning prompt used when a requested reference is missing.
    pub default_voice: Option<PathBuf>,
    /// Whether a failed model load degrades to the placeholder tone engine
    /// instead of erroring the request.
    pub degrade_to_placeholder: bool,
}

fn base_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/v1/audio/speech", post(handlers::generate_speech))
        .route("/v1/voice-references", get(handlers::list_voice_references))
        .route("/v1/voice-references", post(handlers::upload_voice_reference))
        .route(
            "/v1/voice-references/:filename",
            delete(handlers::delete_voice_reference),
        )
}

fn finish(router: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Voice-reference WAVs run to tens of MB
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .with_state(state)
}

/// Router for the Chatterbox server: shared surface plus `/languages`.
pub fn chatterbox_router(state: Arc<AppState>) -> Router {
    finish(
        base_router().route("/languages", get(handlers::list_languages)),
        state,
    )
}

/// Router for the Index TTS server: shared surface plus `/emotions` and
/// `/models`.
pub fn indextts_router(state: Arc<AppState>) -> Router {
    finish(
        base_router()
            .route("/emotions", get(handlers::list_emotions))
            .route("/models", get(handlers::list_models)),
        state,
    )
}
