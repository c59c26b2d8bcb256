//! Audio decoding using Symphonia
//!
//! Decodes any container/codec pair Symphonia supports, downmixes to mono and
//! optionally resamples to the analysis rate.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::CatalogError;
use crate::preprocessing::{channel_mixer, resample};

/// Decoded mono audio ready for analysis
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate of `samples` in Hz
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Wrap mono samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Loads an audio file into a mono sample buffer
pub trait AudioDecoder: Send + Sync {
    /// Decode the file at `path`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Decode` on unsupported or corrupt input
    fn decode(&self, path: &Path) -> Result<DecodedAudio, CatalogError>;
}

/// Symphonia-backed decoder
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    /// Resample to this rate when set
    pub target_sample_rate: Option<u32>,
}

impl SymphoniaDecoder {
    /// Create a decoder that resamples to `target_sample_rate` when given
    pub fn new(target_sample_rate: Option<u32>) -> Self {
        Self { target_sample_rate }
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedAudio, CatalogError> {
        let (interleaved, sample_rate, channels) = decode_interleaved(path)?;
        let mono = channel_mixer::to_mono(&interleaved, channels)?;

        let (samples, sample_rate) = match self.target_sample_rate {
            Some(target) if target != sample_rate => {
                (resample::resample(&mono, sample_rate, target)?, target)
            }
            _ => (mono, sample_rate),
        };

        log::debug!(
            "Decoded {}: {} samples at {} Hz ({} source channels)",
            path.display(),
            samples.len(),
            sample_rate,
            channels
        );

        Ok(DecodedAudio::new(samples, sample_rate))
    }
}

fn decode_failure(path: &Path, reason: impl std::fmt::Display) -> CatalogError {
    CatalogError::Decode(format!("{}: {}", path.display(), reason))
}

/// Decode audio file to interleaved PCM samples
///
/// # Returns
///
/// Tuple of (interleaved samples, sample_rate, channels)
pub fn decode_interleaved(path: &Path) -> Result<(Vec<f32>, u32, usize), CatalogError> {
    let src = File::open(path).map_err(|e| decode_failure(path, e))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_failure(path, e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_failure(path, "no supported audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_failure(path, e))?;

    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_failure(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count();

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupted packets are skipped, the rest of the stream is still usable
                log::debug!("Skipping undecodable packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(decode_failure(path, e)),
        }
    }

    if interleaved.is_empty() || sample_rate == 0 || channels == 0 {
        return Err(decode_failure(path, "no audio frames decoded"));
    }

    Ok((interleaved, sample_rate, channels))
}
