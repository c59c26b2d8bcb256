//! Feature extraction modules
//!
//! This module contains the per-file analysis stages:
//! - Time-frequency transform (STFT, magnitude/phase)
//! - Chroma extraction
//! - Harmonic/percussive separation and tonnetz
//! - MFCC and scalar spectral descriptors
//! - Key detection
//! - Tempo estimation (external tool)

pub mod chroma;
pub mod harmonic;
pub mod key;
pub mod mfcc;
pub mod spectral;
pub mod spectrum;
pub mod tempo;
pub mod tonnetz;
