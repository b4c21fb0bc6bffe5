pub mod handlers;
pub mod routes;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::audio::stretch::{MAX_RATE, MIN_RATE};
use crate::emotion::{build_emotion_vector, EMOTION_DIM};
use crate::voices::VoiceReference;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const MAX_INPUT_CHARS: usize = 10_000;

/// OpenAI-compatible speech request, extended with voice cloning, emotion
/// weights and output shaping. Unset fields fall back to defaults; numeric
/// fields are clamped rather than rejected.
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub input: String,
    pub language: Option<String>,
    #[serde(alias = "audio_prompt_path")]
    pub voice_reference: Option<String>,
    pub emotions: Option<HashMap<String, f32>>,
    pub speed: Option<f32>,
    pub temperature: Option<f32>,
    pub sample_rate: Option<u32>,

    // Legacy OpenAI-client fields, accepted and ignored.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub response_format: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub exaggeration: Option<f32>,
    #[serde(default)]
    pub cfg_weight: Option<f32>,
}

impl SpeechRequest {
    pub fn speed(&self) -> f32 {
        self.speed.unwrap_or(1.0).clamp(MIN_RATE, MAX_RATE)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE).clamp(0.0, 2.0)
    }

    /// Normalized emotion vector for the engine. An omitted mapping
    /// conditions the engine with all-neutral, same as an all-zero one.
    pub fn emotion_vector(&self) -> [f32; EMOTION_DIM] {
        match &self.emotions {
            Some(weights) => build_emotion_vector(weights),
            None => build_emotion_vector(&HashMap::new()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub device: Option<String>,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageInfo>,
}

#[derive(Debug, Serialize)]
pub struct VoiceReferencesResponse {
    pub voice_references: Vec<VoiceReference>,
    pub count: usize,
    pub directory: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub path: String,
    pub size_bytes: u64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub filename: String,
    pub message: String,
}
