//! Short-time Fourier transform
//!
//! Frame-major STFT (one complex spectrum per frame) with a periodic Hann window
//! and centred frames (the signal is zero-padded by `frame_size / 2` on both sides).
//!
//! # Example
//!
//! ```
//! use stratum_catalog::features::spectrum::{stft, magphase};
//!
//! let samples = vec![0.0f32; 22050];
//! let spec = stft(&samples, 2048, 512)?;
//! let (magnitude, _phase) = magphase(&spec);
//! assert_eq!(magnitude[0].len(), 1025);
//! # Ok::<(), stratum_catalog::CatalogError>(())
//! ```

use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;

use crate::error::CatalogError;

/// Complex spectrogram, one `frame_size / 2 + 1` bin spectrum per frame
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Complex spectra, frame-major
    pub frames: Vec<Vec<Complex32>>,

    /// FFT size used
    pub frame_size: usize,

    /// Hop size used
    pub hop_size: usize,
}

impl Spectrogram {
    /// Number of frequency bins per frame
    pub fn n_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Number of frames
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Magnitude spectrogram
    pub fn magnitude(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }

    /// Power spectrogram (squared magnitude)
    pub fn power(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm_sqr()).collect())
            .collect()
    }
}

/// Periodic Hann window
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
        .collect()
}

/// Centre frequency of each STFT bin in Hz
pub fn fft_frequencies(sample_rate: u32, frame_size: usize) -> Vec<f32> {
    (0..=frame_size / 2)
        .map(|k| k as f32 * sample_rate as f32 / frame_size as f32)
        .collect()
}

/// Compute the STFT of `samples`
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `frame_size` - FFT size (e.g. 2048)
/// * `hop_size` - Hop between frames (e.g. 512)
///
/// # Errors
///
/// Returns `CatalogError::InvalidInput` for empty input or zero sizes
pub fn stft(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Spectrogram, CatalogError> {
    if samples.is_empty() {
        return Err(CatalogError::InvalidInput("Empty audio samples".to_string()));
    }
    if frame_size == 0 || hop_size == 0 {
        return Err(CatalogError::InvalidInput(format!(
            "Frame size and hop size must be > 0 (got {}, {})",
            frame_size, hop_size
        )));
    }

    let pad = frame_size / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let n_frames = (padded.len() - frame_size) / hop_size + 1;
    let n_bins = frame_size / 2 + 1;
    let window = hann_window(frame_size);
    let fft = FftPlanner::<f32>::new().plan_fft_forward(frame_size);

    log::debug!(
        "STFT: {} samples, frame={}, hop={}, {} frames",
        samples.len(),
        frame_size,
        hop_size,
        n_frames
    );

    let mut frames = Vec::with_capacity(n_frames);
    let mut buffer = vec![Complex32::new(0.0, 0.0); frame_size];
    for frame in 0..n_frames {
        let start = frame * hop_size;
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex32::new(padded[start + i] * window[i], 0.0);
        }
        fft.process(&mut buffer);
        frames.push(buffer[..n_bins].to_vec());
    }

    Ok(Spectrogram {
        frames,
        frame_size,
        hop_size,
    })
}

/// Split a spectrogram into magnitude and unit-modulus phase
pub fn magphase(spec: &Spectrogram) -> (Vec<Vec<f32>>, Vec<Vec<Complex32>>) {
    let magnitude = spec.magnitude();
    let phase = spec
        .frames
        .iter()
        .zip(&magnitude)
        .map(|(frame, mags)| {
            frame
                .iter()
                .zip(mags)
                .map(|(c, &m)| {
                    if m > 0.0 {
                        *c / m
                    } else {
                        Complex32::new(1.0, 0.0)
                    }
                })
                .collect()
        })
        .collect();
    (magnitude, phase)
}
