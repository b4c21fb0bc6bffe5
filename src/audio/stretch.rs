//! Pitch-preserving time stretch for the speech `speed` parameter.
//!
//! Waveform similarity overlap-add (WSOLA): frames are taken from the input
//! at `rate` times the synthesis hop, aligned against the already-written
//! output by cross-correlation, then cross-faded in. A `rate` above 1.0
//! shortens the audio, below 1.0 lengthens it; pitch is unchanged.

use crate::error::AppError;

pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;

/// Stretch mono audio by `rate` without changing pitch.
pub fn time_stretch(samples: &[f32], sample_rate: u32, rate: f32) -> Result<Vec<f32>, AppError> {
    if !(MIN_RATE..=MAX_RATE).contains(&rate) {
        return Err(AppError::AudioError(format!(
            "Speed {} outside supported range {}-{}",
            rate, MIN_RATE, MAX_RATE
        )));
    }

    if (rate - 1.0).abs() < 1e-3 {
        return Ok(samples.to_vec());
    }

    // 50 ms frames, half-frame synthesis hop
    let frame = ((sample_rate as usize) / 20).max(256);
    let hop_syn = frame / 2;
    let hop_ana = ((hop_syn as f32) * rate).round().max(1.0) as usize;
    let overlap = frame - hop_syn;
    let tolerance = hop_syn / 2;

    if samples.len() <= frame + tolerance {
        return Ok(samples.to_vec());
    }

    let mut output: Vec<f32> = Vec::with_capacity((samples.len() as f32 / rate) as usize + frame);
    output.extend_from_slice(&samples[..frame]);

    let mut in_pos = hop_ana;
    loop {
        let search_base = in_pos.saturating_sub(tolerance);
        if search_base + 2 * tolerance + frame >= samples.len() {
            break;
        }

        // Align the candidate frame with the tail of the output so the
        // cross-fade region stays phase-coherent.
        let out_tail = &output[output.len() - overlap..];
        let mut best_offset = 0usize;
        let mut best_score = f32::MIN;
        for offset in 0..=2 * tolerance {
            let candidate = &samples[search_base + offset..search_base + offset + overlap];
            let score: f32 = candidate
                .iter()
                .zip(out_tail)
                .map(|(a, b)| a * b)
                .sum();
            if score > best_score {
                best_score = score;
                best_offset = offset;
            }
        }

        let frame_start = search_base + best_offset;
        let chosen = &samples[frame_start..frame_start + frame];

        // Linear cross-fade over the overlap region, then append the rest.
        let fade_from = output.len() - overlap;
        for i in 0..overlap {
            let t = i as f32 / overlap as f32;
            output[fade_from + i] = output[fade_from + i] * (1.0 - t) + chosen[i] * t;
        }
        output.extend_from_slice(&chosen[overlap..]);

        in_pos += hop_ana;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(secs: f32, freq: f32, rate: u32) -> Vec<f32> {
        let len = (secs * rate as f32) as usize;
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_unity_rate_is_identity() {
        let samples = sine(0.5, 440.0, 22050);
        let result = time_stretch(&samples, 22050, 1.0).unwrap();
        assert_eq!(result, samples);
    }

    #[test]
    fn test_double_speed_roughly_halves_duration() {
        let samples = sine(2.0, 220.0, 22050);
        let result = time_stretch(&samples, 22050, 2.0).unwrap();
        let expected = samples.len() / 2;
        assert!(result.len() > expected * 7 / 10);
        assert!(result.len() < expected * 13 / 10);
    }

    #[test]
    fn test_half_speed_roughly_doubles_duration() {
        let samples = sine(1.0, 220.0, 22050);
        let result = time_stretch(&samples, 22050, 0.5).unwrap();
        let expected = samples.len() * 2;
        assert!(result.len() > expected * 7 / 10);
        assert!(result.len() < expected * 13 / 10);
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let samples = sine(0.1, 220.0, 22050);
        assert!(time_stretch(&samples, 22050, 0.1).is_err());
        assert!(time_stretch(&samples, 22050, 3.0).is_err());
    }

    #[test]
    fn test_short_input_passthrough() {
        let samples = vec![0.1f32; 64];
        let result = time_stretch(&samples, 22050, 1.5).unwrap();
        assert_eq!(result, samples);
    }
}
