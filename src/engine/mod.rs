pub mod onnx;
pub mod placeholder;
pub mod registry;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use ort::execution_providers::{
    CoreML as CoreMLExecutionProvider, ExecutionProvider, CUDA as CUDAExecutionProvider,
};

use crate::audio::AudioBuffer;
use crate::emotion::EMOTION_DIM;
use crate::error::AppError;

pub use onnx::OnnxTtsEngine;
pub use placeholder::PlaceholderEngine;
pub use registry::ModelRegistry;

/// Compute device an engine is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cuda,
    Mps,
    Cpu,
}

impl FromStr for Device {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cuda" => Ok(Device::Cuda),
            "mps" => Ok(Device::Mps),
            "cpu" => Ok(Device::Cpu),
            other => Err(AppError::EngineError(format!(
                "Unknown device '{}', expected cuda, mps or cpu",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cuda => write!(f, "cuda"),
            Device::Mps => write!(f, "mps"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

impl Device {
    /// Pick the compute device: an explicit override wins, otherwise the best
    /// available accelerator, otherwise CPU.
    pub fn select(explicit: Option<&str>) -> Result<Device, AppError> {
        if let Some(name) = explicit {
            return name.parse();
        }

        if CUDAExecutionProvider::default().is_available().unwrap_or(false) {
            return Ok(Device::Cuda);
        }
        if CoreMLExecutionProvider::default()
            .is_available()
            .unwrap_or(false)
        {
            return Ok(Device::Mps);
        }
        Ok(Device::Cpu)
    }
}

/// Everything an engine needs to render one utterance. The emotion vector is
/// always present and normalized; "no emotions requested" is all-neutral.
#[derive(Debug, Clone)]
pub struct SynthesisParams {
    pub text: String,
    pub language: Option<String>,
    pub speaker_prompt: Option<PathBuf>,
    pub emotion: [f32; EMOTION_DIM],
    pub temperature: f32,
}

impl SynthesisParams {
    pub fn for_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            speaker_prompt: None,
            emotion: crate::emotion::build_emotion_vector(&Default::default()),
            temperature: 0.7,
        }
    }
}

/// A loaded synthesis engine. Implementations are process-lifetime singletons
/// owned by the registry and shared across requests.
pub trait SpeechEngine: Send + Sync {
    fn id(&self) -> &str;

    /// Native output sample rate.
    fn sample_rate(&self) -> u32;

    fn synthesize(&self, params: &SynthesisParams) -> Result<AudioBuffer, AppError>;
}

/// The engine handles one server process owns.
pub struct Engines {
    pub device: Device,
    pub primary: Arc<dyn SpeechEngine>,
    pub multilingual: Option<Arc<dyn SpeechEngine>>,
}

/// Which engine a request is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineRoute {
    Primary,
    Multilingual,
}

impl EngineRoute {
    /// A request routes to the multilingual engine exactly when it names a
    /// language other than the default English.
    pub fn for_language(language: Option<&str>) -> Self {
        match language {
            Some(code) if !code.eq_ignore_ascii_case("en") => EngineRoute::Multilingual,
            _ => EngineRoute::Primary,
        }
    }
}

/// Route a request to an engine and run synthesis.
///
/// The primary path only forwards a speaker prompt that actually exists on
/// disk; the multilingual path forwards the language id unchanged. Engine
/// failures surface as service errors, never retried.
pub fn dispatch(engines: &Engines, params: &SynthesisParams) -> Result<AudioBuffer, AppError> {
    match EngineRoute::for_language(params.language.as_deref()) {
        EngineRoute::Multilingual => {
            let engine = engines
                .multilingual
                .as_ref()
                .unwrap_or(&engines.primary);
            tracing::info!(
                "Dispatching to {} (language: {:?})",
                engine.id(),
                params.language
            );
            engine.synthesize(params)
        }
        EngineRoute::Primary => {
            let mut params = params.clone();
            params.language = None;
            if let Some(prompt) = &params.speaker_prompt {
                if !prompt.exists() {
                    tracing::warn!("Speaker prompt {} not found, ignoring", prompt.display());
                    params.speaker_prompt = None;
                }
            }
            tracing::info!(
                "Dispatching to {} (cloning: {})",
                engines.primary.id(),
                params.speaker_prompt.is_some()
            );
            engines.primary.synthesize(&params)
        }
    }
}
