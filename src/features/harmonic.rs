//! Harmonic-percussive source separation (HPSS)
//!
//! Median filtering of the magnitude spectrogram: horizontal (time) medians keep
//! sustained harmonic partials, vertical (frequency) medians keep broadband
//! percussive events. Soft Wiener-style masks split the complex spectrogram.

use crate::error::CatalogError;
use crate::features::spectrum::Spectrogram;

/// Default median filter length for both directions
pub const DEFAULT_KERNEL: usize = 31;

/// Decompose a spectrogram into harmonic and percussive components
///
/// # Arguments
///
/// * `spec` - Complex spectrogram
/// * `kernel_size` - Median filter length in frames (harmonic) and bins (percussive)
/// * `power` - Mask exponent (2.0 gives Wiener-like masks)
///
/// # Returns
///
/// Tuple of (harmonic, percussive) spectrograms
pub fn hpss_decompose(
    spec: &Spectrogram,
    kernel_size: usize,
    power: f32,
) -> Result<(Spectrogram, Spectrogram), CatalogError> {
    let (harmonic_mag, percussive_mag) = median_filtered(spec, kernel_size)?;

    let mut harmonic = spec.clone();
    let mut percussive = spec.clone();
    for (t, (h_row, p_row)) in harmonic_mag.iter().zip(&percussive_mag).enumerate() {
        for (k, (&h, &p)) in h_row.iter().zip(p_row).enumerate() {
            let mask_h = harmonic_mask(h, p, power);
            harmonic.frames[t][k] *= mask_h;
            percussive.frames[t][k] *= 1.0 - mask_h;
        }
    }

    Ok((harmonic, percussive))
}

/// Harmonic component only
///
/// Same result as the first element of [`hpss_decompose`], without building the
/// percussive spectrogram.
pub fn harmonic_component(
    spec: &Spectrogram,
    kernel_size: usize,
    power: f32,
) -> Result<Spectrogram, CatalogError> {
    let (harmonic_mag, percussive_mag) = median_filtered(spec, kernel_size)?;

    let mut harmonic = spec.clone();
    for ((frame, h_row), p_row) in harmonic
        .frames
        .iter_mut()
        .zip(&harmonic_mag)
        .zip(&percussive_mag)
    {
        for ((bin, &h), &p) in frame.iter_mut().zip(h_row).zip(p_row) {
            *bin *= harmonic_mask(h, p, power);
        }
    }

    Ok(harmonic)
}

/// Harmonic component with the default kernel and Wiener masks
pub fn harmonic(spec: &Spectrogram) -> Result<Spectrogram, CatalogError> {
    harmonic_component(spec, DEFAULT_KERNEL, 2.0)
}

/// Time-median (harmonic) and frequency-median (percussive) magnitudes
fn median_filtered(
    spec: &Spectrogram,
    kernel_size: usize,
) -> Result<(Vec<Vec<f32>>, Vec<Vec<f32>>), CatalogError> {
    if kernel_size == 0 {
        return Err(CatalogError::InvalidInput(
            "HPSS kernel size must be > 0".to_string(),
        ));
    }
    if spec.frames.is_empty() {
        return Err(CatalogError::InvalidInput(
            "Cannot separate an empty spectrogram".to_string(),
        ));
    }

    log::debug!(
        "Median filtering spectrogram for HPSS: {} frames, kernel={}",
        spec.n_frames(),
        kernel_size
    );

    let magnitude = spec.magnitude();
    let n_frames = magnitude.len();
    let n_bins = spec.n_bins();
    let half = kernel_size / 2;

    let mut window = Vec::with_capacity(kernel_size);
    let mut harmonic_mag = vec![vec![0.0f32; n_bins]; n_frames];
    let mut percussive_mag = vec![vec![0.0f32; n_bins]; n_frames];

    for t in 0..n_frames {
        let t_lo = t.saturating_sub(half);
        let t_hi = (t + half + 1).min(n_frames);
        for k in 0..n_bins {
            window.clear();
            window.extend((t_lo..t_hi).map(|tt| magnitude[tt][k]));
            harmonic_mag[t][k] = median(&mut window);

            let k_lo = k.saturating_sub(half);
            let k_hi = (k + half + 1).min(n_bins);
            window.clear();
            window.extend_from_slice(&magnitude[t][k_lo..k_hi]);
            percussive_mag[t][k] = median(&mut window);
        }
    }

    Ok((harmonic_mag, percussive_mag))
}

/// Soft harmonic mask for one bin; an all-zero bin splits evenly
fn harmonic_mask(harmonic_mag: f32, percussive_mag: f32, power: f32) -> f32 {
    let h = harmonic_mag.powf(power);
    let p = percussive_mag.powf(power);
    let total = h + p;
    if total > f32::MIN_POSITIVE {
        h / total
    } else {
        0.5
    }
}

fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mid = values.len() / 2;
    let (_, m, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *m
}
