//! Configuration parameters for cataloging

use serde::{Deserialize, Serialize};

/// Catalog configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    // Folder scan
    /// Recognized audio extensions, matched case-insensitively (default: ["mp3"])
    pub extensions: Vec<String>,

    // Decoding
    /// Analysis sample rate; `None` keeps the file's native rate (default: 22050)
    pub sample_rate: Option<u32>,

    // STFT parameters
    /// Frame size for STFT (default: 2048)
    pub frame_size: usize,

    /// Hop size for STFT (default: 512)
    pub hop_size: usize,

    // MFCC
    /// Number of cepstral coefficients (default: 20)
    pub n_mfcc: usize,

    /// Number of mel bands (default: 128)
    pub n_mels: usize,

    // Record defaults
    /// Description written when none is supplied (default: "N/A")
    pub description: String,

    /// Write tempo and comment back into the file's tag container (default: true)
    pub write_tags: bool,

    // External tools
    /// ffmpeg executable used for intermediate conversions (default: "ffmpeg")
    pub ffmpeg_path: String,

    /// aubio executable used for tempo estimation (default: "aubio")
    pub aubio_path: String,

    // Scheduling
    /// Per-file workers; 1 processes files strictly in sequence (default: 1)
    pub jobs: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".to_string()],
            sample_rate: Some(22050),
            frame_size: 2048,
            hop_size: 512,
            n_mfcc: 20,
            n_mels: 128,
            description: "N/A".to_string(),
            write_tags: true,
            ffmpeg_path: "ffmpeg".to_string(),
            aubio_path: "aubio".to_string(),
            jobs: 1,
        }
    }
}

impl CatalogConfig {
    /// Replace the recognized extensions (leading dots are ignored)
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Set the number of per-file workers (clamped to at least 1)
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Enable or disable tag write-back
    pub fn with_tag_writing(mut self, enabled: bool) -> Self {
        self.write_tags = enabled;
        self
    }

    /// True if `extension` is one of the recognized audio extensions
    pub fn is_recognized_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_matching() {
        let config = CatalogConfig::default().with_extensions([".MP3", "wav"]);
        assert!(config.is_recognized_extension("mp3"));
        assert!(config.is_recognized_extension("WAV"));
        assert!(!config.is_recognized_extension("json"));
    }

    #[test]
    fn test_jobs_clamped() {
        assert_eq!(CatalogConfig::default().with_jobs(0).jobs, 1);
    }
}
