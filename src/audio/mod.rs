pub mod resampler;
pub mod stretch;

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::AppError;

/// Peak-normalization target. Leaves headroom so the 16-bit encode never clips.
const PEAK_TARGET: f32 = 0.95;

/// Raw synthesis output: mono f32 samples plus their sample rate.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Scale the buffer so the maximum absolute sample is `PEAK_TARGET`.
/// All-zero buffers are left untouched.
pub fn peak_normalize(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        let gain = PEAK_TARGET / peak;
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    }
}

/// Run the full post-processing pipeline on a raw engine buffer:
/// peak normalization, optional pitch-preserving speed change, optional
/// resampling to the requested rate. Returns the shaped buffer ready for
/// WAV encoding. Any failing step aborts the whole request.
pub fn postprocess(
    mut buffer: AudioBuffer,
    speed: f32,
    target_rate: Option<u32>,
) -> Result<AudioBuffer, AppError> {
    peak_normalize(&mut buffer.samples);

    if (speed - 1.0).abs() > f32::EPSILON {
        buffer.samples = stretch::time_stretch(&buffer.samples, buffer.sample_rate, speed)?;
    }

    if let Some(rate) = target_rate {
        if rate != buffer.sample_rate {
            buffer.samples = resampler::resample(&buffer.samples, buffer.sample_rate, rate)?;
            buffer.sample_rate = rate;
        }
    }

    Ok(buffer)
}

/// Encode a buffer as a 16-bit PCM mono WAV byte stream.
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>, AppError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut bytes = Vec::new();
    {
        let cursor = Cursor::new(&mut bytes);
        let mut writer = WavWriter::new(cursor, spec)
            .map_err(|e| AppError::AudioError(format!("Failed to create WAV writer: {}", e)))?;

        for sample in &buffer.samples {
            let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(scaled)
                .map_err(|e| AppError::AudioError(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| AppError::AudioError(format!("Failed to finalize WAV: {}", e)))?;
    }

    Ok(bytes)
}

/// Read a WAV file into a mono f32 buffer. Multi-channel input is averaged
/// down to one channel. Used to load voice-reference prompts for cloning.
pub fn read_wav(path: &Path) -> Result<AudioBuffer, AppError> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| AppError::AudioError(format!("Failed to open WAV {}: {}", path.display(), e)))?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AppError::AudioError(format!("Failed to read WAV samples: {}", e)))?,
        SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()
                .map_err(|e| AppError::AudioError(format!("Failed to read WAV samples: {}", e)))?
        }
    };

    let samples = if channels <= 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(AudioBuffer::new(samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_normalize_scales_to_target() {
        let mut samples = vec![0.1, -0.5, 0.25];
        peak_normalize(&mut samples);
        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_peak_normalize_zero_buffer_unchanged() {
        let mut samples = vec![0.0; 16];
        peak_normalize(&mut samples);
        assert!(samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_peak_normalize_attenuates_loud_input() {
        let mut samples = vec![2.0, -4.0];
        peak_normalize(&mut samples);
        assert!((samples[1].abs() - 0.95).abs() < 1e-6);
        assert!((samples[0].abs() - 0.475).abs() < 1e-6);
    }

    #[test]
    fn test_encode_wav_empty() {
        let wav = encode_wav(&AudioBuffer::new(vec![], 22050)).unwrap();
        // Valid WAV header even for empty audio
        assert!(wav.starts_with(b"RIFF"));
    }

    #[test]
    fn test_encode_wav_valid() {
        let buffer = AudioBuffer::new(vec![0.0, 0.5, -0.5, 0.95, -0.95], 22050);
        let wav = encode_wav(&buffer).unwrap();
        assert!(wav.starts_with(b"RIFF"));
        assert!(wav.len() > 44);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let buffer = AudioBuffer::new(vec![0.0, 0.25, -0.25, 0.5], 16000);
        let wav = encode_wav(&buffer).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.wav");
        std::fs::write(&path, &wav).unwrap();

        let decoded = read_wav(&path).unwrap();
        assert_eq!(decoded.sample_rate, 16000);
        assert_eq!(decoded.samples.len(), 4);
        for (a, b) in buffer.samples.iter().zip(&decoded.samples) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_postprocess_noop_keeps_rate() {
        let buffer = AudioBuffer::new(vec![0.5; 100], 24000);
        let out = postprocess(buffer, 1.0, None).unwrap();
        assert_eq!(out.sample_rate, 24000);
        assert_eq!(out.samples.len(), 100);
    }

    #[test]
    fn test_postprocess_resamples_to_target() {
        let samples: Vec<f32> = (0..4800)
            .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 48000.0).sin())
            .collect();
        let out = postprocess(AudioBuffer::new(samples, 48000), 1.0, Some(24000)).unwrap();
        assert_eq!(out.sample_rate, 24000);
        assert!(out.samples.len() > 1600);
        assert!(out.samples.len() < 3600);
    }
}
