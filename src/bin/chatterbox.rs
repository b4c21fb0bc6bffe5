use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tts_api_server::api::routes::{chatterbox_router, AppState};
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

    let config = ServerConfig::from_env(4123, "/opt/chatterbox/models", "/opt/chatterbox/voices");
    let addr = config.socket_addr();

    tracing::info!("Chatterbox TTS API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Starting server on http://{}", addr);
    tracing::info!("Voices directory: {}", config.voices_dir.display());

    let registry = ModelRegistry::new(
        EngineVariant::Chatterbox,
        config.model_path.clone(),
        config.device.clone(),
    );

    // No usable degraded mode for the primary engine: a load failure aborts
    // startup before the listener is bound.
    registry
        .ensure_loaded()
        .expect("Failed to initialize Chatterbox TTS engines");
    tracing::info!("All Chatterbox TTS engines initialized successfully");

    let metadata = serde_json::json!({
        "name": "Chatterbox TTS API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "models": {
            "chatterbox": "English TTS with voice cloning support",
            "multilingual": "23 languages support"
        },
        "endpoints": {
            "health": "/health",
            "languages": "/languages",
            "speech": "/v1/audio/speech",
            "voice_references": "/v1/voice-references"
        }
    });

    let state = Arc::new(AppState {
        registry,
        store: VoiceStore::new(config.voices_dir.clone()),
        metadata,
        default_voice: None,
        degrade_to_placeholder: false,
    });

    let app = chatterbox_router(Arc::clone(&state));

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
    tracing::info!("Shutting down Chatterbox TTS server...");
}
