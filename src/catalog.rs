//! Folder cataloging
//!
//! Drives one run over a folder:
//!
//! 1. Scan the top level of the folder for recognized audio files (sorted by name)
//! 2. Per file: decode, estimate tempo and key, extract spectral descriptors,
//!    assemble the record, write the per-file manifest, write tags
//! 3. Write the combined manifest once, after every file has been attempted
//!
//! Each file ends in a [`FileOutcome`]. A failure at any per-file step skips only
//! that file: it gets no per-file manifest, no tag update and no combined entry.
//! Spectral extraction failures are the exception: they are absorbed and the
//! record is kept without spectral fields.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use crate::analysis::assembler::MetadataAssembler;
use crate::analysis::manifest::{CombinedManifest, ManifestStore};
use crate::analysis::result::AudioMetadataRecord;
use crate::analysis::tagging::{LoftyTagWriter, TagUpdate, TagWriter};
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::features::key::{KeyEstimator, StftTonalProvider, TonalFeatureProvider};
use crate::features::spectral::{SpectralFeatureProvider, StftFeatureProvider};
use crate::features::tempo::{AubioTempoEstimator, TempoEstimator};
use crate::io::{AudioDecoder, SymphoniaDecoder};

/// Result of processing one file
#[derive(Debug)]
pub enum FileOutcome {
    /// Every stage completed; the record belongs in the combined manifest
    Cataloged {
        /// Source filename
        filename: String,
        /// Assembled record
        record: AudioMetadataRecord,
        /// Per-file manifest location
        manifest_path: PathBuf,
        /// True if the tag container was updated
        tagged: bool,
    },
    /// A stage failed; nothing was persisted for this file
    Skipped {
        /// Source filename
        filename: String,
        /// Failure that ended processing
        error: CatalogError,
    },
}

impl FileOutcome {
    /// Source filename
    pub fn filename(&self) -> &str {
        match self {
            FileOutcome::Cataloged { filename, .. } | FileOutcome::Skipped { filename, .. } => {
                filename
            }
        }
    }

    /// True if the file was cataloged
    pub fn is_cataloged(&self) -> bool {
        matches!(self, FileOutcome::Cataloged { .. })
    }
}

/// A file left out of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Source filename
    pub filename: String,
    /// Failure description
    pub reason: String,
    /// The file analyzed but its manifest or tags could not be stored
    pub storage_failure: bool,
}

/// Summary of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Combined manifest location
    pub combined_manifest: PathBuf,

    /// Records written to the combined manifest
    pub manifest: CombinedManifest,

    /// Cataloged filenames in processing order
    pub cataloged: Vec<String>,

    /// Skipped files in processing order
    pub skipped: Vec<SkippedFile>,

    /// Files whose tag container was updated
    pub tagged: usize,

    /// Wall time in milliseconds
    pub elapsed_ms: f32,
}

impl RunReport {
    /// Number of files attempted
    pub fn attempted(&self) -> usize {
        self.cataloged.len() + self.skipped.len()
    }
}

/// Folder orchestrator
///
/// Owns the analysis stages for a run. Stages are trait objects so any of them
/// can be swapped; [`Cataloger::from_config`] wires the default implementations.
pub struct Cataloger {
    config: CatalogConfig,
    decoder: Box<dyn AudioDecoder>,
    tempo: Box<dyn TempoEstimator>,
    key: KeyEstimator,
    features: Box<dyn SpectralFeatureProvider>,
    tags: Option<Box<dyn TagWriter>>,
    assembler: MetadataAssembler,
}

impl Cataloger {
    /// Default stages configured from `config`
    ///
    /// - Decoding: Symphonia, resampled to `config.sample_rate`
    /// - Tempo: aubio with ffmpeg conversion
    /// - Key and spectral descriptors: STFT providers
    /// - Tags: lofty, unless `config.write_tags` is false
    pub fn from_config(config: CatalogConfig) -> Self {
        let tags: Option<Box<dyn TagWriter>> = if config.write_tags {
            Some(Box::new(LoftyTagWriter))
        } else {
            None
        };

        Self {
            decoder: Box::new(SymphoniaDecoder::new(config.sample_rate)),
            tempo: Box::new(AubioTempoEstimator::from_config(&config)),
            key: KeyEstimator::new(Box::new(StftTonalProvider::from_config(&config))),
            features: Box::new(StftFeatureProvider::from_config(&config)),
            tags,
            assembler: MetadataAssembler::new(config.description.clone()),
            config,
        }
    }

    /// Replace the decoder
    pub fn with_decoder(mut self, decoder: Box<dyn AudioDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replace the tempo estimator
    pub fn with_tempo_estimator(mut self, tempo: Box<dyn TempoEstimator>) -> Self {
        self.tempo = tempo;
        self
    }

    /// Replace the chroma/tonnetz source used for key estimation
    pub fn with_tonal_provider(mut self, provider: Box<dyn TonalFeatureProvider>) -> Self {
        self.key = KeyEstimator::new(provider);
        self
    }

    /// Replace the spectral feature provider
    pub fn with_feature_provider(mut self, features: Box<dyn SpectralFeatureProvider>) -> Self {
        self.features = features;
        self
    }

    /// Replace the tag writer; `None` disables tag write-back
    pub fn with_tag_writer(mut self, tags: Option<Box<dyn TagWriter>>) -> Self {
        self.tags = tags;
        self
    }

    /// Configuration of this run
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// List recognized audio files in the top level of `folder`, sorted by name
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInput` if `folder` is not a directory
    pub fn scan_folder(&self, folder: &Path) -> Result<Vec<PathBuf>, CatalogError> {
        if !folder.is_dir() {
            return Err(CatalogError::InvalidInput(format!(
                "{} is not a directory",
                folder.display()
            )));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(folder)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let recognized = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| self.config.is_recognized_extension(e))
                .unwrap_or(false);
            if recognized {
                files.push(path);
            }
        }
        files.sort();

        log::debug!("Found {} audio files in {}", files.len(), folder.display());
        Ok(files)
    }

    /// Run every analysis stage on one file and assemble its record
    ///
    /// Nothing is persisted. Spectral extraction failures leave the record
    /// without spectral fields; every other failure is returned.
    pub fn analyze_file(&self, path: &Path) -> Result<AudioMetadataRecord, CatalogError> {
        let audio = self.decoder.decode(path)?;
        let bpm = self.tempo.estimate(path, &audio)?;
        let key = self.key.estimate(&audio)?;

        let features = match self.features.extract(&audio) {
            Ok(summary) => Some(summary),
            Err(e) => {
                log::warn!(
                    "Spectral features unavailable for {}: {}",
                    path.display(),
                    e
                );
                None
            }
        };

        Ok(self.assembler.assemble(bpm, &key.name(), features))
    }

    /// Catalog one file: analyze, write its manifest, update its tags
    pub fn process_file(&self, store: &ManifestStore, path: &Path) -> FileOutcome {
        let filename = file_name(path);

        match self.catalog_file(store, path, &filename) {
            Ok((record, manifest_path, tagged)) => {
                log::info!(
                    "Cataloged {}: {:.2} BPM, key {}",
                    filename,
                    record.bpm,
                    record.key
                );
                FileOutcome::Cataloged {
                    filename,
                    record,
                    manifest_path,
                    tagged,
                }
            }
            Err(error) => {
                if error.is_file_level() {
                    log::warn!("Skipping {}: {}", filename, error);
                } else {
                    log::error!("Skipping {}, could not store results: {}", filename, error);
                }
                FileOutcome::Skipped { filename, error }
            }
        }
    }

    fn catalog_file(
        &self,
        store: &ManifestStore,
        path: &Path,
        filename: &str,
    ) -> Result<(AudioMetadataRecord, PathBuf, bool), CatalogError> {
        let record = self.analyze_file(path)?;
        let manifest_path = store.write_per_file(filename, &record)?;

        let tagged = match &self.tags {
            Some(writer) => match writer.write(path, &TagUpdate::from_record(&record)) {
                Ok(tagged) => tagged,
                Err(e) => {
                    if let Err(cleanup) = store.remove_per_file(filename) {
                        log::warn!("Could not remove manifest of {}: {}", filename, cleanup);
                    }
                    return Err(e);
                }
            },
            None => false,
        };

        Ok((record, manifest_path, tagged))
    }

    /// Catalog every recognized file in `folder`
    ///
    /// # Errors
    ///
    /// Returns an error only if the folder cannot be scanned or the combined
    /// manifest cannot be written; per-file failures are reported in the
    /// [`RunReport`].
    pub fn run(&self, folder: &Path) -> Result<RunReport, CatalogError> {
        let start = Instant::now();
        let files = self.scan_folder(folder)?;
        let store = ManifestStore::new(folder);

        log::info!(
            "Cataloging {} files in {} ({} jobs)",
            files.len(),
            folder.display(),
            self.config.jobs
        );

        let outcomes: Vec<FileOutcome> = if self.config.jobs > 1 && files.len() > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs)
                .build()
                .map_err(|e| CatalogError::InvalidInput(format!("worker pool: {}", e)))?;
            pool.install(|| {
                files
                    .par_iter()
                    .map(|path| self.process_file(&store, path))
                    .collect()
            })
        } else {
            files
                .iter()
                .map(|path| self.process_file(&store, path))
                .collect()
        };

        let mut manifest = CombinedManifest::new();
        let mut cataloged = Vec::new();
        let mut skipped = Vec::new();
        let mut tagged_count = 0;

        for outcome in outcomes {
            match outcome {
                FileOutcome::Cataloged {
                    filename,
                    record,
                    tagged,
                    ..
                } => {
                    if tagged {
                        tagged_count += 1;
                    }
                    manifest.insert(filename.clone(), record);
                    cataloged.push(filename);
                }
                FileOutcome::Skipped { filename, error } => skipped.push(SkippedFile {
                    filename,
                    reason: error.to_string(),
                    storage_failure: !error.is_file_level(),
                }),
            }
        }

        let combined_manifest = store.write_combined(&manifest)?;
        log::info!(
            "Combined manifest written to {} ({} cataloged, {} skipped)",
            combined_manifest.display(),
            cataloged.len(),
            skipped.len()
        );

        Ok(RunReport {
            combined_manifest,
            manifest,
            cataloged,
            skipped,
            tagged: tagged_count,
            elapsed_ms: start.elapsed().as_secs_f32() * 1000.0,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::spectral::SpectralSummary;
    use crate::io::DecodedAudio;

    struct SilentDecoder;

    impl AudioDecoder for SilentDecoder {
        fn decode(&self, path: &Path) -> Result<DecodedAudio, CatalogError> {
            if path.to_string_lossy().contains("corrupt") {
                return Err(CatalogError::Decode("corrupt".to_string()));
            }
            Ok(DecodedAudio::new(vec![0.0; 256], 22050))
        }
    }

    struct FixedTempo(f32);

    impl TempoEstimator for FixedTempo {
        fn estimate(&self, _path: &Path, _audio: &DecodedAudio) -> Result<f32, CatalogError> {
            Ok(self.0)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct CMajor;

    impl TonalFeatureProvider for CMajor {
        fn chroma(&self, _audio: &DecodedAudio) -> Result<Vec<Vec<f32>>, CatalogError> {
            let mut c = vec![0.1; 12];
            c[0] = 1.0;
            Ok(vec![c])
        }

        fn harmonic_tonnetz(&self, _audio: &DecodedAudio) -> Result<Vec<Vec<f32>>, CatalogError> {
            Ok(vec![vec![0.0, 0.0, 0.1, 0.0, 0.3, 0.0]])
        }
    }

    struct BrokenFeatures;

    impl SpectralFeatureProvider for BrokenFeatures {
        fn extract(&self, _audio: &DecodedAudio) -> Result<SpectralSummary, CatalogError> {
            Err(CatalogError::FeatureExtraction("boom".to_string()))
        }
    }

    fn cataloger() -> Cataloger {
        Cataloger::from_config(CatalogConfig::default().with_tag_writing(false))
            .with_decoder(Box::new(SilentDecoder))
            .with_tempo_estimator(Box::new(FixedTempo(128.0)))
            .with_tonal_provider(Box::new(CMajor))
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp3", "a.MP3", "notes.txt", "c.wav"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mp3")).unwrap();

        let files = cataloger().scan_folder(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["a.MP3", "b.mp3"]);
    }

    #[test]
    fn test_scan_rejects_missing_folder() {
        let err = cataloger()
            .scan_folder(Path::new("/nonexistent/catalog/folder"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));
    }

    #[test]
    fn test_feature_failure_is_absorbed() {
        let cataloger = cataloger().with_feature_provider(Box::new(BrokenFeatures));
        let record = cataloger.analyze_file(Path::new("loop1.mp3")).unwrap();
        assert_eq!(record.bpm, 128.0);
        assert_eq!(record.key, "C");
        assert!(record.features.is_none());
    }

    #[test]
    fn test_decode_failure_skips_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());
        let outcome = cataloger().process_file(&store, &dir.path().join("corrupt.mp3"));

        assert!(!outcome.is_cataloged());
        assert_eq!(outcome.filename(), "corrupt.mp3");
        assert!(!store.per_file_path("corrupt.mp3").exists());
    }
}
