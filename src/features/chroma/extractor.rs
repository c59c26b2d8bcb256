//! Chroma vector extraction
//!
//! Converts an STFT power spectrogram to 12-element chroma vectors using a
//! Gaussian-bump chroma filterbank (bins start at C, standard A440 tuning).

use super::normalization::normalize_max;
use crate::error::CatalogError;
use crate::features::spectrum::stft;

/// Number of pitch classes
pub const N_CHROMA: usize = 12;

/// Build a chroma filterbank projecting `frame_size / 2 + 1` FFT bins onto 12 pitch classes
///
/// Each filter is a Gaussian bump around its pitch class in every octave, columns are
/// L2-normalized and weighted by a Gaussian over octaves centred on octave 5 (width 2).
///
/// # Returns
///
/// `N_CHROMA` rows of `frame_size / 2 + 1` weights, row 0 = C
pub fn chroma_filterbank(sample_rate: u32, frame_size: usize) -> Vec<Vec<f32>> {
    let n_bins = frame_size / 2 + 1;
    let mut weights = vec![vec![0.0f32; n_bins]; N_CHROMA];
    if frame_size == 0 || sample_rate == 0 {
        return weights;
    }

    let n_chroma = N_CHROMA as f32;
    // A0 = 27.5 Hz is octave 0
    let ref_freq = 440.0 / 16.0;

    // Fractional chroma bin of every FFT bin; DC gets a value 1.5 octaves below bin 1
    let mut frq_bins = Vec::with_capacity(n_bins);
    for k in 1..n_bins.max(2) {
        let freq = k as f32 * sample_rate as f32 / frame_size as f32;
        frq_bins.push(n_chroma * (freq / ref_freq).log2());
    }
    let dc = frq_bins.first().copied().unwrap_or(0.0) - 1.5 * n_chroma;
    frq_bins.insert(0, dc);
    frq_bins.truncate(n_bins);

    let bin_widths: Vec<f32> = (0..frq_bins.len())
        .map(|i| {
            frq_bins
                .get(i + 1)
                .map(|next| (next - frq_bins[i]).max(1.0))
                .unwrap_or(1.0)
        })
        .collect();

    let half = (n_chroma / 2.0).round();
    for (c, row) in weights.iter_mut().enumerate() {
        for (k, w) in row.iter_mut().enumerate() {
            let d = ((frq_bins[k] - c as f32 + half + 10.0 * n_chroma) % n_chroma) - half;
            *w = (-0.5 * (2.0 * d / bin_widths[k]).powi(2)).exp();
        }
    }

    for k in 0..n_bins {
        let norm = weights
            .iter()
            .map(|row| row[k] * row[k])
            .sum::<f32>()
            .sqrt()
            .max(1e-10);
        let octave = frq_bins[k] / n_chroma;
        let octave_weight = (-0.5 * ((octave - 5.0) / 2.0).powi(2)).exp();
        for row in weights.iter_mut() {
            row[k] = row[k] / norm * octave_weight;
        }
    }

    // Filters were built with A as bin 0; rotate so C comes first
    weights.rotate_left(3);
    weights
}

/// Project power spectra onto pitch classes
///
/// # Arguments
///
/// * `power` - Power spectrogram, frame-major
/// * `filterbank` - Output of `chroma_filterbank`
///
/// # Returns
///
/// One max-normalized 12-element chroma vector per frame
pub fn chroma_from_power(power: &[Vec<f32>], filterbank: &[Vec<f32>]) -> Vec<Vec<f32>> {
    power
        .iter()
        .map(|frame| {
            let mut chroma: Vec<f32> = filterbank
                .iter()
                .map(|row| row.iter().zip(frame).map(|(w, p)| w * p).sum())
                .collect();
            normalize_max(&mut chroma);
            chroma
        })
        .collect()
}

/// Extract chroma vectors from audio samples
///
/// # Arguments
///
/// * `samples` - Audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `frame_size` - FFT frame size (default: 2048)
/// * `hop_size` - Hop size (default: 512)
///
/// # Returns
///
/// Vector of 12-element chroma vectors (one per frame)
pub fn extract_chroma(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<Vec<f32>>, CatalogError> {
    log::debug!("Extracting chroma: {} samples at {} Hz", samples.len(), sample_rate);

    let spec = stft(samples, frame_size, hop_size)?;
    let filterbank = chroma_filterbank(sample_rate, frame_size);
    Ok(chroma_from_power(&spec.power(), &filterbank))
}

/// Average chroma vectors over time
///
/// # Errors
///
/// Returns `CatalogError::InvalidInput` if there are no frames or a frame is not 12 elements
pub fn mean_chroma(chroma_vectors: &[Vec<f32>]) -> Result<[f32; N_CHROMA], CatalogError> {
    if chroma_vectors.is_empty() {
        return Err(CatalogError::InvalidInput("Empty chroma vectors".to_string()));
    }

    let mut mean = [0.0f32; N_CHROMA];
    for (i, chroma) in chroma_vectors.iter().enumerate() {
        if chroma.len() != N_CHROMA {
            return Err(CatalogError::InvalidInput(format!(
                "Chroma vector at index {} has {} elements, expected {}",
                i,
                chroma.len(),
                N_CHROMA
            )));
        }
        for (m, &c) in mean.iter_mut().zip(chroma) {
            *m += c;
        }
    }

    let n = chroma_vectors.len() as f32;
    for m in mean.iter_mut() {
        *m /= n;
    }
    Ok(mean)
}
