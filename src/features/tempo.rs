//! Tempo estimation
//!
//! Tempo is delegated to the `aubio` command-line tool. aubio only reads a few
//! formats natively, so other inputs are first converted to a WAV intermediate
//! with `ffmpeg`. The intermediate is a scoped temporary file: it is removed when
//! estimation returns, whether it succeeded or not.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::io::DecodedAudio;

/// Produces a single beats-per-minute estimate for a file
pub trait TempoEstimator: Send + Sync {
    /// Estimate tempo in BPM
    ///
    /// Implementations may work from the file at `path` or from the decoded `audio`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Estimation` if no estimate can be produced
    fn estimate(&self, path: &Path, audio: &DecodedAudio) -> Result<f32, CatalogError>;

    /// Name of this estimator (for logging)
    fn name(&self) -> &'static str;
}

/// aubio CLI tempo estimator with ffmpeg conversion for non-native formats
#[derive(Debug, Clone)]
pub struct AubioTempoEstimator {
    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,
    /// aubio executable
    pub aubio_path: PathBuf,
    /// Extensions aubio reads without conversion
    pub native_extensions: Vec<String>,
    /// Directory for intermediates; system temp dir when `None`
    pub scratch_dir: Option<PathBuf>,
}

impl Default for AubioTempoEstimator {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

impl AubioTempoEstimator {
    /// Take tool paths from the catalog configuration
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            ffmpeg_path: PathBuf::from(&config.ffmpeg_path),
            aubio_path: PathBuf::from(&config.aubio_path),
            native_extensions: vec!["wav".to_string()],
            scratch_dir: None,
        }
    }

    /// True if both external tools can be launched
    pub fn is_available(&self) -> bool {
        let ffmpeg = Command::new(&self.ffmpeg_path).arg("-version").output().is_ok();
        let aubio = Command::new(&self.aubio_path).arg("--help").output().is_ok();
        ffmpeg && aubio
    }

    /// True if `path` must be converted before aubio can read it
    pub fn requires_conversion(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => !self
                .native_extensions
                .iter()
                .any(|n| n.eq_ignore_ascii_case(ext)),
            None => true,
        }
    }

    /// Convert `path` to a WAV intermediate that is deleted when dropped
    fn convert_to_wav(&self, path: &Path) -> Result<NamedTempFile, CatalogError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("stratum-tempo-").suffix(".wav");
        let intermediate = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        log::debug!(
            "Converting {} -> {} for tempo estimation",
            path.display(),
            intermediate.path().display()
        );

        let output = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(path)
            .arg(intermediate.path())
            .output()
            .map_err(|e| {
                CatalogError::Estimation(format!(
                    "failed to launch {}: {}",
                    self.ffmpeg_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(CatalogError::Estimation(format!(
                "ffmpeg conversion of {} failed: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(intermediate)
    }

    fn run_aubio(&self, path: &Path) -> Result<f32, CatalogError> {
        let output = Command::new(&self.aubio_path)
            .arg("tempo")
            .arg(path)
            .output()
            .map_err(|e| {
                CatalogError::Estimation(format!(
                    "failed to launch {}: {}",
                    self.aubio_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(CatalogError::Estimation(format!(
                "aubio tempo failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_aubio_bpm(&stdout).ok_or_else(|| {
            CatalogError::Estimation(format!(
                "no tempo in aubio output for {}: {:?}",
                path.display(),
                stdout.trim()
            ))
        })
    }
}

impl TempoEstimator for AubioTempoEstimator {
    fn estimate(&self, path: &Path, _audio: &DecodedAudio) -> Result<f32, CatalogError> {
        let bpm = if self.requires_conversion(path) {
            let intermediate = self.convert_to_wav(path)?;
            self.run_aubio(intermediate.path())?
        } else {
            self.run_aubio(path)?
        };

        log::debug!("Tempo of {}: {:.2} BPM", path.display(), bpm);
        Ok(bpm)
    }

    fn name(&self) -> &'static str {
        "aubio"
    }
}

/// Parse the `"<value> bpm"` line printed by `aubio tempo`
///
/// The last line holding a finite value wins.
pub fn parse_aubio_bpm(output: &str) -> Option<f32> {
    output.lines().rev().find_map(|line| {
        let mut tokens = line.split_whitespace();
        let value = tokens.next()?;
        match tokens.next() {
            Some(unit) if unit.eq_ignore_ascii_case("bpm") => {
                value.parse::<f32>().ok().filter(|bpm| bpm.is_finite())
            }
            _ => None,
        }
    })
}
