//! Audio preprocessing modules
//!
//! This module contains utilities for preparing decoded audio for analysis:
//! - Channel mixing (interleaved multichannel to mono)
//! - Sample-rate conversion to the analysis rate

pub mod channel_mixer;
pub mod resample;
