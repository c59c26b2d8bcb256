//! Audio I/O modules
//!
//! Audio decoding using Symphonia.

pub mod decoder;

pub use decoder::{AudioDecoder, DecodedAudio, SymphoniaDecoder};
