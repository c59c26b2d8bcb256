//! Spectral summary features
//!
//! Scalar, time-averaged descriptors of a decoded file:
//! - Duration
//! - Spectral centroid and bandwidth (magnitude weighted)
//! - Zero-crossing rate
//! - Mean STFT chroma energy
//! - Mean MFCC value (over frames and coefficients)

use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::features::chroma::{chroma_filterbank, chroma_from_power};
use crate::features::mfcc::mfcc_from_power;
use crate::features::spectrum::{fft_frequencies, stft};
use crate::io::DecodedAudio;

/// Time-averaged spectral descriptors of one file
///
/// Serialized with the manifest field names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralSummary {
    /// Duration in seconds
    #[serde(rename = "Length")]
    pub length: f32,

    /// Mean spectral centroid in Hz
    #[serde(rename = "SpectralCentroid")]
    pub spectral_centroid: f32,

    /// Mean spectral bandwidth in Hz
    #[serde(rename = "SpectralBandwidth")]
    pub spectral_bandwidth: f32,

    /// Mean zero-crossing rate (crossings per sample)
    #[serde(rename = "ZeroCrossingRate")]
    pub zero_crossing_rate: f32,

    /// Mean chroma energy over frames and pitch classes
    #[serde(rename = "ChromaSTFT")]
    pub chroma_energy: f32,

    /// Mean MFCC over frames and coefficients
    #[serde(rename = "MFCC")]
    pub mfcc_summary: f32,
}

/// Computes spectral descriptors for decoded audio
pub trait SpectralFeatureProvider: Send + Sync {
    /// Extract the spectral summary of `audio`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::FeatureExtraction` if any descriptor cannot be computed
    fn extract(&self, audio: &DecodedAudio) -> Result<SpectralSummary, CatalogError>;
}

/// STFT-based spectral feature provider
#[derive(Debug, Clone)]
pub struct StftFeatureProvider {
    /// FFT frame size
    pub frame_size: usize,
    /// Hop size
    pub hop_size: usize,
    /// Cepstral coefficients
    pub n_mfcc: usize,
    /// Mel bands
    pub n_mels: usize,
}

impl Default for StftFeatureProvider {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

impl StftFeatureProvider {
    /// Take STFT and MFCC sizes from the catalog configuration
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            frame_size: config.frame_size,
            hop_size: config.hop_size,
            n_mfcc: config.n_mfcc,
            n_mels: config.n_mels,
        }
    }
}

impl SpectralFeatureProvider for StftFeatureProvider {
    fn extract(&self, audio: &DecodedAudio) -> Result<SpectralSummary, CatalogError> {
        let samples = &audio.samples;
        let sr = audio.sample_rate;
        if samples.is_empty() || sr == 0 {
            return Err(CatalogError::FeatureExtraction(
                "no samples to analyse".to_string(),
            ));
        }

        let spec = stft(samples, self.frame_size, self.hop_size)
            .map_err(|e| CatalogError::FeatureExtraction(e.to_string()))?;
        let magnitude = spec.magnitude();
        let power = spec.power();
        let freqs = fft_frequencies(sr, self.frame_size);

        let (centroids, bandwidths): (Vec<f32>, Vec<f32>) = magnitude
            .iter()
            .map(|frame| centroid_and_bandwidth(frame, &freqs))
            .unzip();

        let chroma = chroma_from_power(&power, &chroma_filterbank(sr, self.frame_size));
        let mfcc = mfcc_from_power(&power, sr, self.frame_size, self.n_mfcc, self.n_mels);

        let summary = SpectralSummary {
            length: audio.duration_seconds(),
            spectral_centroid: mean(&centroids),
            spectral_bandwidth: mean(&bandwidths),
            zero_crossing_rate: mean(&zero_crossing_rates(
                samples,
                self.frame_size,
                self.hop_size,
            )),
            chroma_energy: mean_of_frames(&chroma),
            mfcc_summary: mean_of_frames(&mfcc),
        };

        if !summary_is_finite(&summary) {
            return Err(CatalogError::FeatureExtraction(format!(
                "non-finite descriptor in {:?}",
                summary
            )));
        }

        log::debug!(
            "Spectral summary: centroid={:.1} Hz, bandwidth={:.1} Hz, zcr={:.4}",
            summary.spectral_centroid,
            summary.spectral_bandwidth,
            summary.zero_crossing_rate
        );

        Ok(summary)
    }
}

fn summary_is_finite(s: &SpectralSummary) -> bool {
    [
        s.length,
        s.spectral_centroid,
        s.spectral_bandwidth,
        s.zero_crossing_rate,
        s.chroma_energy,
        s.mfcc_summary,
    ]
    .iter()
    .all(|v| v.is_finite())
}

/// Magnitude-weighted centroid and bandwidth (second central moment) of one frame
fn centroid_and_bandwidth(frame: &[f32], freqs: &[f32]) -> (f32, f32) {
    let total: f32 = frame.iter().sum();
    if total <= 1e-10 {
        return (0.0, 0.0);
    }
    let centroid = frame.iter().zip(freqs).map(|(m, f)| m * f).sum::<f32>() / total;
    let variance = frame
        .iter()
        .zip(freqs)
        .map(|(m, f)| m * (f - centroid).powi(2))
        .sum::<f32>()
        / total;
    (centroid, variance.sqrt())
}

/// Per-frame zero-crossing rate (crossings / frame length)
pub fn zero_crossing_rates(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<f32> {
    if samples.len() < 2 || frame_size == 0 || hop_size == 0 {
        return Vec::new();
    }
    let frame_size = frame_size.min(samples.len());
    (0..=(samples.len() - frame_size) / hop_size)
        .map(|i| {
            let frame = &samples[i * hop_size..i * hop_size + frame_size];
            let crossings = frame
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count();
            crossings as f32 / frame_size as f32
        })
        .collect()
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

fn mean_of_frames(frames: &[Vec<f32>]) -> f32 {
    let count: usize = frames.iter().map(Vec::len).sum();
    if count == 0 {
        return 0.0;
    }
    frames.iter().flatten().sum::<f32>() / count as f32
}
