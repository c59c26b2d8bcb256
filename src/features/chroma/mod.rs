//! Chroma extraction modules
//!
//! Extract pitch-class distribution (12 semitones) from audio:
//! - Chroma filterbank and chromagram computation
//! - Per-frame normalization

pub mod extractor;
pub mod normalization;

pub use extractor::{chroma_filterbank, chroma_from_power, extract_chroma, mean_chroma};
