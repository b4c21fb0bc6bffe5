//! Degraded-mode engine: when real weights cannot be loaded the emotional
//! server still answers speech requests with a short synthetic tone instead
//! of refusing to start.

use crate::audio::AudioBuffer;
use crate::error::AppError;

use super::{SpeechEngine, SynthesisParams};

const TONE_HZ: f32 = 440.0;
const TONE_SECS: f32 = 1.0;
const TONE_AMPLITUDE: f32 = 0.1;

pub struct PlaceholderEngine {
    sample_rate: u32,
}

impl PlaceholderEngine {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl SpeechEngine for PlaceholderEngine {
    fn id(&self) -> &str {
        "placeholder"
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn synthesize(&self, _params: &SynthesisParams) -> Result<AudioBuffer, AppError> {
        tracing::warn!("Model not loaded - generating placeholder audio");

        let len = (self.sample_rate as f32 * TONE_SECS) as usize;
        let samples = (0..len)
            .map(|i| {
                let t = i as f32 / self.sample_rate as f32;
                TONE_AMPLITUDE * (2.0 * std::f32::consts::PI * TONE_HZ * t).sin()
            })
            .collect();

        Ok(AudioBuffer::new(samples, self.sample_rate))
    }
}
