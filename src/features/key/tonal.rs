//! Tonal feature providers
//!
//! Supplies the chromagram and harmonic tonnetz the key estimator classifies.

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::features::chroma::extract_chroma;
use crate::features::tonnetz::harmonic_tonnetz;
use crate::io::DecodedAudio;

/// Source of chroma and tonnetz time series
pub trait TonalFeatureProvider: Send + Sync {
    /// 12-element chroma vector per frame
    fn chroma(&self, audio: &DecodedAudio) -> Result<Vec<Vec<f32>>, CatalogError>;

    /// 6-element tonnetz vector per frame, computed on the harmonic component
    fn harmonic_tonnetz(&self, audio: &DecodedAudio) -> Result<Vec<Vec<f32>>, CatalogError>;
}

/// STFT chroma + median-filter HPSS tonnetz
#[derive(Debug, Clone)]
pub struct StftTonalProvider {
    /// FFT frame size
    pub frame_size: usize,
    /// Hop size
    pub hop_size: usize,
}

impl Default for StftTonalProvider {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

impl StftTonalProvider {
    /// Take STFT sizes from the catalog configuration
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            frame_size: config.frame_size,
            hop_size: config.hop_size,
        }
    }
}

impl TonalFeatureProvider for StftTonalProvider {
    fn chroma(&self, audio: &DecodedAudio) -> Result<Vec<Vec<f32>>, CatalogError> {
        extract_chroma(
            &audio.samples,
            audio.sample_rate,
            self.frame_size,
            self.hop_size,
        )
    }

    fn harmonic_tonnetz(&self, audio: &DecodedAudio) -> Result<Vec<Vec<f32>>, CatalogError> {
        harmonic_tonnetz(
            &audio.samples,
            audio.sample_rate,
            self.frame_size,
            self.hop_size,
        )
    }
}
