//! Sample-rate conversion
//!
//! Band-limited sinc resampling via rubato, processed in fixed-size chunks.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::CatalogError;

const CHUNK_SIZE: usize = 1024;

/// Resample mono audio from `src_rate` to `dst_rate`
///
/// The output length is `round(len * dst_rate / src_rate)`.
///
/// # Errors
///
/// Returns `CatalogError::InvalidInput` for a zero rate and `CatalogError::Decode`
/// if the resampler fails.
pub fn resample(samples: &[f32], src_rate: u32, dst_rate: u32) -> Result<Vec<f32>, CatalogError> {
    if src_rate == 0 || dst_rate == 0 {
        return Err(CatalogError::InvalidInput(format!(
            "Invalid sample rates: {} -> {}",
            src_rate, dst_rate
        )));
    }

    if src_rate == dst_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    log::debug!(
        "Resampling {} samples: {} Hz -> {} Hz",
        samples.len(),
        src_rate,
        dst_rate
    );

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = dst_rate as f64 / src_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_SIZE, 1)
        .map_err(|e| CatalogError::Decode(format!("resampler setup failed: {}", e)))?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let mut output = Vec::with_capacity(expected + CHUNK_SIZE);

    for chunk in samples.chunks(CHUNK_SIZE) {
        let mut block = vec![0.0f32; CHUNK_SIZE];
        block[..chunk.len()].copy_from_slice(chunk);

        let out = resampler
            .process(&[block], None)
            .map_err(|e| CatalogError::Decode(format!("resampling failed: {}", e)))?;
        output.extend_from_slice(&out[0]);
    }

    output.truncate(expected);
    Ok(output)
}
