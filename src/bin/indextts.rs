use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tts_api_server::api::routes::{indextts_router, AppState};
use tts_api_server::config::ServerConfig;
use tts_api_server::engine::registry::EngineVariant;
use tts_api_server::engine::ModelRegistry;
use tts_api_server::voices::VoiceStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env(5000, "/opt/index-tts/checkpoints", "/opt/index-tts/voices");
    let addr = config.socket_addr();

    tracing::info!("Index TTS API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Starting server on http://{}", addr);
    tracing::info!("Model path: {}", config.model_path.display());
    tracing::info!("Voices directory: {}", config.voices_dir.display());

    let registry = ModelRegistry::new(
        EngineVariant::IndexTts,
        config.model_path.clone(),
        config.device.clone(),
    );

    // This variant keeps serving when weights are unavailable; synthesis
    // then returns a short test tone.
    registry.ensure_loaded_or_placeholder();

    let metadata = serde_json::json!({
        "name": "Index TTS API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Text-to-speech with emotional expression and voice cloning",
        "endpoints": {
            "generate_speech": "/v1/audio/speech",
            "list_voice_references": "/v1/voice-references (GET)",
            "upload_voice_reference": "/v1/voice-references (POST)",
            "delete_voice_reference": "/v1/voice-references/{filename} (DELETE)",
            "list_emotions": "/emotions",
            "list_models": "/models",
            "health": "/health"
        },
        "note": "Voice cloning uses uploaded WAV references, not predefined voice names"
    });

    let state = Arc::new(AppState {
        registry,
        store: VoiceStore::new(config.voices_dir.clone()),
        metadata,
        default_voice: Some(config.model_path.join("default_voice.wav")),
        degrade_to_placeholder: true,
    });

    let app = indextts_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    state.registry.shutdown();
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutting down Index TTS server...");
}
