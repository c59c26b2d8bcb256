//! Channel mixing utilities (multichannel to mono conversion)

use crate::error::CatalogError;

/// Average interleaved multichannel samples down to mono
///
/// # Arguments
///
/// * `interleaved` - Interleaved samples (frame-major: `[L0, R0, L1, R1, ...]`)
/// * `channels` - Number of interleaved channels
///
/// # Returns
///
/// Mono samples, one per frame. A trailing partial frame is dropped.
pub fn to_mono(interleaved: &[f32], channels: usize) -> Result<Vec<f32>, CatalogError> {
    if channels == 0 {
        return Err(CatalogError::InvalidInput(
            "Channel count must be > 0".to_string(),
        ));
    }

    if channels == 1 {
        return Ok(interleaved.to_vec());
    }

    let scale = 1.0 / channels as f32;
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect())
}
