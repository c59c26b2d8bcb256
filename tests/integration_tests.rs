//! Integration tests for folder cataloging

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use stratum_catalog::analysis::manifest::COMBINED_MANIFEST_NAME;
use stratum_catalog::analysis::tagging::{read_tag_update, LoftyTagWriter, TagUpdate, TagWriter};
use stratum_catalog::features::key::TonalFeatureProvider;
use stratum_catalog::features::spectral::SpectralFeatureProvider;
use stratum_catalog::features::tempo::TempoEstimator;
use stratum_catalog::io::{AudioDecoder, DecodedAudio, SymphoniaDecoder};
use stratum_catalog::{
    CatalogConfig, CatalogError, Cataloger, Key, ManifestStore, SpectralSummary,
};
use tempfile::TempDir;

/// Write a mono 16-bit WAV holding a sum of sines
fn write_wav(path: &Path, partials: &[(f32, f32)], seconds: f32, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let n = (seconds * sample_rate as f32) as usize;
    for i in 0..n {
        let t = i as f32 / sample_rate as f32;
        let v: f32 = partials
            .iter()
            .map(|(freq, amp)| amp * (2.0 * std::f32::consts::PI * freq * t).sin())
            .sum();
        writer.write_sample((v * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn write_tone(folder: &Path, name: &str, freq: f32) -> PathBuf {
    let path = folder.join(name);
    write_wav(&path, &[(freq, 0.5)], 1.0, 22050);
    path
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

/// Chroma peaking at C with fixed tonnetz axis averages
struct FixedTonality {
    minor_third: f32,
    reference: f32,
}

impl TonalFeatureProvider for FixedTonality {
    fn chroma(&self, _audio: &DecodedAudio) -> Result<Vec<Vec<f32>>, CatalogError> {
        let mut c = vec![0.2f32; 12];
        c[0] = 1.0;
        Ok(vec![c; 8])
    }

    fn harmonic_tonnetz(&self, _audio: &DecodedAudio) -> Result<Vec<Vec<f32>>, CatalogError> {
        Ok(vec![vec![0.0, 0.0, self.minor_third, 0.0, self.reference, 0.0]; 8])
    }
}

struct BrokenFeatures;

impl SpectralFeatureProvider for BrokenFeatures {
    fn extract(&self, _audio: &DecodedAudio) -> Result<SpectralSummary, CatalogError> {
        Err(CatalogError::FeatureExtraction("mfcc failed".to_string()))
    }
}

#[derive(Clone, Default)]
struct RecordingTagWriter {
    writes: Arc<Mutex<Vec<(PathBuf, TagUpdate)>>>,
}

impl TagWriter for RecordingTagWriter {
    fn write(&self, path: &Path, update: &TagUpdate) -> Result<bool, CatalogError> {
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), update.clone()));
        Ok(true)
    }
}

struct FailingTagWriter;

impl TagWriter for FailingTagWriter {
    fn write(&self, path: &Path, _update: &TagUpdate) -> Result<bool, CatalogError> {
        Err(CatalogError::persistence(path, "read-only file"))
    }
}

fn wav_config() -> CatalogConfig {
    CatalogConfig::default()
        .with_extensions(["wav"])
        .with_tag_writing(false)
}

/// Real decoding and spectral features, fixed tempo and tonality
fn cataloger(bpm: f32) -> Cataloger {
    Cataloger::from_config(wav_config())
        .with_tempo_estimator(Box::new(FixedTempo(bpm)))
        .with_tonal_provider(Box::new(FixedTonality {
            minor_third: 0.1,
            reference: 0.3,
        }))
}

fn combined_json(folder: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(folder.join(COMBINED_MANIFEST_NAME)).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_combined_keys_equal_input_files() {
    let dir = TempDir::new().unwrap();
    write_tone(dir.path(), "a.wav", 220.0);
    write_tone(dir.path(), "b.wav", 440.0);
    write_tone(dir.path(), "c.wav", 880.0);
    std::fs::write(dir.path().join("readme.txt"), "not audio").unwrap();

    let report = cataloger(120.0).run(dir.path()).unwrap();

    assert_eq!(report.cataloged, vec!["a.wav", "b.wav", "c.wav"]);
    assert!(report.skipped.is_empty());

    let combined = combined_json(dir.path());
    let mut keys: Vec<&String> = combined.as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["a.wav", "b.wav", "c.wav"]);

    let store = ManifestStore::new(dir.path());
    for name in ["a.wav", "b.wav", "c.wav"] {
        assert!(store.per_file_path(name).exists());
    }
    assert!(!store.per_file_path("readme.txt").exists());
}

#[test]
fn test_decode_failure_is_excluded() {
    let dir = TempDir::new().unwrap();
    write_tone(dir.path(), "good.wav", 440.0);
    std::fs::write(dir.path().join("broken.wav"), b"RIFF\x00\x00garbage").unwrap();

    let report = cataloger(120.0).run(dir.path()).unwrap();

    assert_eq!(report.cataloged, vec!["good.wav"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].filename, "broken.wav");
    assert!(!report.skipped[0].storage_failure);

    let store = ManifestStore::new(dir.path());
    let combined = store.read_combined().unwrap();
    assert!(combined.contains("good.wav"));
    assert!(!combined.contains("broken.wav"));
    assert!(!store.per_file_path("broken.wav").exists());
}

#[test]
fn test_feature_failure_keeps_bpm_and_key() {
    let dir = TempDir::new().unwrap();
    write_tone(dir.path(), "loop1.wav", 440.0);

    let report = cataloger(128.0)
        .with_feature_provider(Box::new(BrokenFeatures))
        .run(dir.path())
        .unwrap();
    assert_eq!(report.cataloged, vec!["loop1.wav"]);

    let combined = combined_json(dir.path());
    let record = combined["loop1.wav"].as_object().unwrap();
    assert_eq!(record["BPM"], 128.0);
    assert_eq!(record["Key"], "C");
    assert_eq!(record["Description"], "N/A");
    assert_eq!(record["IfItLoops"], "Unknown");
    for field in [
        "Length",
        "SpectralCentroid",
        "SpectralBandwidth",
        "ZeroCrossingRate",
        "ChromaSTFT",
        "MFCC",
    ] {
        assert!(!record.contains_key(field), "{} should be absent", field);
    }
}

#[test]
fn test_major_scenario_record() {
    let dir = TempDir::new().unwrap();
    write_tone(dir.path(), "loop1.wav", 261.63);

    cataloger(128.0).run(dir.path()).unwrap();

    let per_file = ManifestStore::new(dir.path())
        .read_per_file("loop1.wav")
        .unwrap();
    let record = &per_file["loop1.wav"];
    assert_eq!(record.bpm, 128.0);
    assert_eq!(record.key, "C");

    let features = record.features.unwrap();
    assert!((features.length - 1.0).abs() < 0.01);
    assert!(features.spectral_centroid > 0.0);
}

#[test]
fn test_minor_scenario_record() {
    let dir = TempDir::new().unwrap();
    write_tone(dir.path(), "loop1.wav", 261.63);

    let cataloger = cataloger(128.0).with_tonal_provider(Box::new(FixedTonality {
        minor_third: 0.4,
        reference: 0.2,
    }));
    let report = cataloger.run(dir.path()).unwrap();

    assert_eq!(report.manifest.get("loop1.wav").unwrap().key, "Cm");
}

#[test]
fn test_reruns_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    write_tone(dir.path(), "a.wav", 330.0);
    write_tone(dir.path(), "b.wav", 550.0);
    let combined = dir.path().join(COMBINED_MANIFEST_NAME);

    cataloger(100.0).run(dir.path()).unwrap();
    let first = std::fs::read(&combined).unwrap();

    cataloger(100.0).run(dir.path()).unwrap();
    let second = std::fs::read(&combined).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_combined_manifest_reflects_current_run_only() {
    let dir = TempDir::new().unwrap();
    write_tone(dir.path(), "a.wav", 330.0);
    write_tone(dir.path(), "b.wav", 550.0);
    cataloger(100.0).run(dir.path()).unwrap();

    std::fs::remove_file(dir.path().join("b.wav")).unwrap();
    let report = cataloger(100.0).run(dir.path()).unwrap();

    assert_eq!(report.manifest.len(), 1);
    let combined = ManifestStore::new(dir.path()).read_combined().unwrap();
    assert_eq!(combined.filenames().collect::<Vec<_>>(), vec!["a.wav"]);
}

#[test]
fn test_parallel_run_matches_sequential() {
    let sequential = TempDir::new().unwrap();
    let parallel = TempDir::new().unwrap();
    for dir in [&sequential, &parallel] {
        for (i, freq) in [220.0, 330.0, 440.0, 550.0].iter().enumerate() {
            write_tone(dir.path(), &format!("tone{}.wav", i), *freq);
        }
    }

    cataloger(90.0).run(sequential.path()).unwrap();
    Cataloger::from_config(wav_config().with_jobs(3))
        .with_tempo_estimator(Box::new(FixedTempo(90.0)))
        .with_tonal_provider(Box::new(FixedTonality {
            minor_third: 0.1,
            reference: 0.3,
        }))
        .run(parallel.path())
        .unwrap();

    assert_eq!(
        std::fs::read(sequential.path().join(COMBINED_MANIFEST_NAME)).unwrap(),
        std::fs::read(parallel.path().join(COMBINED_MANIFEST_NAME)).unwrap()
    );
}

#[test]
fn test_tag_fields_match_manifest() {
    let dir = TempDir::new().unwrap();
    let path = write_tone(dir.path(), "loop1.wav", 440.0);
    let recorder = RecordingTagWriter::default();

    let report = cataloger(127.6)
        .with_tag_writer(Some(Box::new(recorder.clone())))
        .run(dir.path())
        .unwrap();
    assert_eq!(report.tagged, 1);

    let record = &ManifestStore::new(dir.path())
        .read_per_file("loop1.wav")
        .unwrap()["loop1.wav"];
    let writes = recorder.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, path);
    assert_eq!(writes[0].1.tempo, record.bpm.trunc() as u32);
    assert_eq!(writes[0].1.tempo, 127);
    assert_eq!(writes[0].1.comment, record.description);
}

#[test]
fn test_tag_failure_skips_file() {
    let dir = TempDir::new().unwrap();
    write_tone(dir.path(), "loop1.wav", 440.0);

    let report = cataloger(120.0)
        .with_tag_writer(Some(Box::new(FailingTagWriter)))
        .run(dir.path())
        .unwrap();

    assert!(report.cataloged.is_empty());
    assert_eq!(report.skipped[0].filename, "loop1.wav");
    assert!(report.skipped[0].storage_failure);
    assert!(!ManifestStore::new(dir.path())
        .per_file_path("loop1.wav")
        .exists());
    assert!(report.manifest.is_empty());
    assert!(dir.path().join(COMBINED_MANIFEST_NAME).exists());
}

#[test]
fn test_lofty_roundtrip_on_wav() {
    let dir = TempDir::new().unwrap();
    let path = write_tone(dir.path(), "loop1.wav", 440.0);

    let update = TagUpdate {
        tempo: 128,
        comment: "N/A".to_string(),
    };
    assert!(LoftyTagWriter.write(&path, &update).unwrap());
    assert_eq!(read_tag_update(&path).unwrap(), Some(update));

    // Still decodable after tagging
    let audio = SymphoniaDecoder::new(None).decode(&path).unwrap();
    assert_eq!(audio.sample_rate, 22050);
}

#[test]
fn test_decode_resamples_to_analysis_rate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hi_rate.wav");
    write_wav(&path, &[(440.0, 0.5)], 1.0, 44100);

    let audio = SymphoniaDecoder::new(Some(22050)).decode(&path).unwrap();
    assert_eq!(audio.sample_rate, 22050);
    assert!((audio.duration_seconds() - 1.0).abs() < 0.01);
}

#[test]
fn test_full_stft_key_on_c_major_triad() {
    let dir = TempDir::new().unwrap();
    write_wav(
        &dir.path().join("triad.wav"),
        &[(261.63, 0.5), (329.63, 0.15), (392.0, 0.15)],
        2.0,
        22050,
    );

    let report = Cataloger::from_config(wav_config())
        .with_tempo_estimator(Box::new(FixedTempo(120.0)))
        .run(dir.path())
        .unwrap();

    let record = report.manifest.get("triad.wav").unwrap();
    let key = Key::from_name(&record.key).unwrap();
    assert_eq!(key.root(), 0);
    assert!(record.has_features());
}
