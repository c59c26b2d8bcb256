//! Key detection modules
//!
//! Detect the musical key of a decoded file:
//! - Root pitch class from the time-averaged chromagram
//! - Major/minor quality from the harmonic tonnetz

pub mod detector;
pub mod tonal;

pub use detector::{axis_means, classify_key, is_minor, root_pitch_class, KeyEstimator};
pub use tonal::{StftTonalProvider, TonalFeatureProvider};
