//! Sample-rate conversion between an engine's native rate and the rate a
//! client asked for, using sinc interpolation.

use rubato::{
    calculate_cutoff, Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};

use crate::error::AppError;

const CHUNK_SIZE: usize = 1024;

/// Resample mono f32 audio from `from_rate` to `to_rate`.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AppError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    // Short buffers fit a single resampler pass; longer audio is chunked to
    // keep the sinc state small.
    if samples.len() <= CHUNK_SIZE * 2 {
        resample_single_pass(samples, from_rate, to_rate)
    } else {
        resample_chunked(samples, from_rate, to_rate)
    }
}

fn sinc_params(sinc_len: usize, window: WindowFunction) -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len,
        f_cutoff: calculate_cutoff(sinc_len, window),
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window,
    }
}

fn resample_single_pass(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>, AppError> {
    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        2.0,
        sinc_params(256, WindowFunction::BlackmanHarris2),
        samples.len(),
        1,
    )
    .map_err(|e| AppError::AudioError(format!("Failed to create resampler: {}", e)))?;

    let output = resampler
        .process(&[samples.to_vec()], None)
        .map_err(|e| AppError::AudioError(format!("Resampling failed: {}", e)))?;

    Ok(output.into_iter().next().unwrap_or_default())
}

fn resample_chunked(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AppError> {
    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(
        ratio,
        1.1,
        sinc_params(128, WindowFunction::Blackman2),
        CHUNK_SIZE,
        1,
    )
    .map_err(|e| AppError::AudioError(format!("Failed to create resampler: {}", e)))?;

    let mut output = Vec::with_capacity((samples.len() as f64 * ratio * 1.1) as usize);

    let mut chunks = samples.chunks_exact(CHUNK_SIZE);
    for chunk in &mut chunks {
        let processed = resampler
            .process(&[chunk.to_vec()], None)
            .map_err(|e| AppError::AudioError(format!("Resampling failed: {}", e)))?;
        if let Some(out) = processed.into_iter().next() {
            output.extend(out);
        }
    }

    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let input = [remainder];
        let processed = resampler
            .process_partial(Some(&input[..]), None)
            .map_err(|e| AppError::AudioError(format!("Resampling failed: {}", e)))?;
        if let Some(out) = processed.into_iter().next() {
            output.extend(out);
        }
    }

    Ok(output)
}
