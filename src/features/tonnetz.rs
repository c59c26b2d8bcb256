//! Tonal centroid (tonnetz) features
//!
//! Projects L1-normalized chroma onto three circles: fifths (rows 0-1),
//! minor thirds (rows 2-3) and major thirds (rows 4-5), each as an (x, y) pair.
//!
//! # Reference
//!
//! Harte, C., Sandler, M., & Gasser, M. (2006). Detecting Harmonic Change in Musical Audio.
//! *Proceedings of the 1st ACM Workshop on Audio and Music Computing Multimedia*, 21-26.

use crate::error::CatalogError;
use crate::features::chroma::{chroma_filterbank, chroma_from_power, normalization::normalize_sum};
use crate::features::harmonic;
use crate::features::spectrum::stft;

/// Tonnetz dimensionality
pub const N_TONNETZ: usize = 6;

/// (semitone step, radius) for each circle
const CIRCLES: [(usize, f32); 3] = [(7, 1.0), (3, 1.0), (4, 0.5)];

/// Project one chroma vector onto the tonnetz
///
/// A silent frame maps to the origin.
pub fn tonnetz_frame(chroma: &[f32]) -> Vec<f32> {
    let mut normed = chroma.to_vec();
    normalize_sum(&mut normed);

    let mut out = vec![0.0f32; N_TONNETZ];
    for (axis, &(step, radius)) in CIRCLES.iter().enumerate() {
        for (pc, &c) in normed.iter().enumerate() {
            let angle = 2.0 * std::f32::consts::PI * (step * pc) as f32 / 12.0;
            out[2 * axis] += radius * c * angle.cos();
            out[2 * axis + 1] += radius * c * angle.sin();
        }
    }
    out
}

/// Tonnetz for every chroma frame
pub fn tonnetz(chroma_vectors: &[Vec<f32>]) -> Vec<Vec<f32>> {
    chroma_vectors.iter().map(|c| tonnetz_frame(c)).collect()
}

/// Tonnetz of the harmonic component of `samples`
///
/// Separates the harmonic part of the STFT, builds its chromagram and projects it.
pub fn harmonic_tonnetz(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<Vec<f32>>, CatalogError> {
    let spec = stft(samples, frame_size, hop_size)?;
    let harmonic = harmonic::harmonic(&spec)?;
    let filterbank = chroma_filterbank(sample_rate, frame_size);
    let chroma = chroma_from_power(&harmonic.power(), &filterbank);
    Ok(tonnetz(&chroma))
}
