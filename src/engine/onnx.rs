use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::execution_providers::{
    CoreML as CoreMLExecutionProvider, CUDA as CUDAExecutionProvider,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use serde::Deserialize;

use crate::audio::{self, AudioBuffer};
use crate::emotion::EMOTION_DIM;
use crate::error::AppError;

use super::{Device, SpeechEngine, SynthesisParams};

/// Conditioning tensor layout: language index, temperature, then the emotion
/// vector. The sidecar config documents this next to the weights.
const STYLE_DIM: usize = 2 + EMOTION_DIM;

/// Sidecar JSON shipped next to each `.onnx` file, describing the exported
/// graph: native sample rate, the text token map and the language id table.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub sample_rate: u32,
    #[serde(default)]
    pub token_id_map: HashMap<String, i64>,
    #[serde(default)]
    pub languages: HashMap<String, i64>,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::EngineError(format!("Missing engine config {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// A pretrained TTS graph addressed through an ONNX Runtime session.
///
/// The session is taken under a mutex for the duration of each `run`;
/// concurrent requests serialize at the engine call.
pub struct OnnxTtsEngine {
    id: String,
    session: Mutex<Session>,
    config: EngineConfig,
}

impl OnnxTtsEngine {
    /// Load `{stem}.onnx` + `{stem}.json` from the model directory and bind
    /// the session to the selected device.
    pub fn load(model_dir: &Path, stem: &str, device: Device) -> Result<Self, AppError> {
        let model_path: PathBuf = model_dir.join(format!("{}.onnx", stem));
        let config_path = model_dir.join(format!("{}.json", stem));

        if !model_path.exists() {
            return Err(AppError::EngineError(format!(
                "Model weights not found: {}",
                model_path.display()
            )));
        }

        let config = EngineConfig::load(&config_path)?;

        let mut builder = Session::builder()
            .map_err(|e| AppError::EngineError(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| AppError::EngineError(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| AppError::EngineError(format!("Failed to set threads: {}", e)))?;

        builder = match device {
            Device::Cuda => builder
                .with_execution_providers([CUDAExecutionProvider::default().build()])
                .map_err(|e| AppError::EngineError(format!("Failed to enable CUDA: {}", e)))?,
            Device::Mps => builder
                .with_execution_providers([CoreMLExecutionProvider::default().build()])
                .map_err(|e| AppError::EngineError(format!("Failed to enable CoreML: {}", e)))?,
            Device::Cpu => builder,
        };

        let session = builder
            .commit_from_file(&model_path)
            .map_err(|e| AppError::EngineError(format!("Failed to load model: {}", e)))?;

        tracing::info!(
            "Loaded engine '{}' from {} (sample rate: {})",
            stem,
            model_path.display(),
            config.sample_rate
        );

        Ok(Self {
            id: stem.to_string(),
            session: Mutex::new(session),
            config,
        })
    }

    /// Map text to token ids through the config's table, falling back to raw
    /// codepoints for characters the table does not cover.
    fn tokenize(&self, text: &str) -> Vec<i64> {
        text.chars()
            .map(|ch| {
                self.config
                    .token_id_map
                    .get(&ch.to_string())
                    .copied()
                    .unwrap_or(ch as i64)
            })
            .collect()
    }

    fn language_index(&self, language: Option<&str>) -> Result<i64, AppError> {
        match language {
            None => Ok(0),
            Some(code) => {
                let code = code.to_lowercase();
                self.config.languages.get(&code).copied().ok_or_else(|| {
                    AppError::BadRequest(format!("Unsupported language '{}'", code))
                })
            }
        }
    }

    /// Load the speaker-prompt WAV and resample it to the engine's rate.
    fn prompt_samples(&self, path: &Path) -> Result<Vec<f32>, AppError> {
        let prompt = audio::read_wav(path)?;
        if prompt.sample_rate == self.config.sample_rate {
            return Ok(prompt.samples);
        }
        audio::resampler::resample(&prompt.samples, prompt.sample_rate, self.config.sample_rate)
    }
}

impl SpeechEngine for OnnxTtsEngine {
    fn id(&self) -> &str {
        &self.id
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn synthesize(&self, params: &SynthesisParams) -> Result<AudioBuffer, AppError> {
        let tokens = self.tokenize(&params.text);
        if tokens.is_empty() {
            return Ok(AudioBuffer::new(Vec::new(), self.config.sample_rate));
        }

        let token_count = tokens.len();
        let tokens_value = Value::from_array((vec![1, token_count], tokens))
            .map_err(|e| AppError::SynthesisError(format!("Failed to create token tensor: {}", e)))?;

        let lengths_value = Value::from_array((vec![1], vec![token_count as i64]))
            .map_err(|e| AppError::SynthesisError(format!("Failed to create lengths tensor: {}", e)))?;

        let mut style = vec![0.0f32; STYLE_DIM];
        style[0] = self.language_index(params.language.as_deref())? as f32;
        style[1] = params.temperature;
        style[2..2 + EMOTION_DIM].copy_from_slice(&params.emotion);
        let style_value = Value::from_array((vec![1, STYLE_DIM], style))
            .map_err(|e| AppError::SynthesisError(format!("Failed to create style tensor: {}", e)))?;

        let prompt = match &params.speaker_prompt {
            Some(path) => self.prompt_samples(path)?,
            None => Vec::new(),
        };
        let prompt_len = prompt.len();
        let prompt_value = Value::from_array((vec![1, prompt_len], prompt))
            .map_err(|e| AppError::SynthesisError(format!("Failed to create prompt tensor: {}", e)))?;

        let mut session = self.session.lock().unwrap();
        let outputs = session
            .run(ort::inputs![
                tokens_value,
                lengths_value,
                style_value,
                prompt_value
            ])
            .map_err(|e| AppError::SynthesisError(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get("audio")
            .or_else(|| outputs.get("output"))
            .ok_or_else(|| AppError::SynthesisError("Missing output tensor".to_string()))?;

        let output_view = output
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::SynthesisError(format!("Failed to extract output tensor: {}", e)))?;

        let samples: Vec<f32> = output_view.1.iter().copied().collect();

        Ok(AudioBuffer::new(samples, self.config.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"sample_rate": 24000}"#).unwrap();
        assert_eq!(config.sample_rate, 24000);
        assert!(config.token_id_map.is_empty());
        assert!(config.languages.is_empty());
    }

    #[test]
    fn test_engine_config_languages() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"sample_rate": 24000, "languages": {"en": 0, "fr": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.languages.get("fr"), Some(&3));
    }

    #[test]
    fn test_load_missing_weights_is_engine_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = OnnxTtsEngine::load(dir.path(), "tts", Device::Cpu);
        assert!(matches!(result, Err(AppError::EngineError(_))));
    }
}
