//! Manifest persistence
//!
//! Two documents per folder:
//! - `<filename>_metadata.json`: `{ "<filename>": record }`, written once per file
//! - `combined_audio_metadata.json`: every record of the run keyed by filename,
//!   written once at the end of the run
//!
//! Documents are pretty-printed with 4-space indentation and written through a
//! temporary file in the target folder that is renamed into place.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::analysis::result::AudioMetadataRecord;
use crate::error::CatalogError;

/// File name of the combined manifest
pub const COMBINED_MANIFEST_NAME: &str = "combined_audio_metadata.json";

/// Suffix appended to a source filename to name its per-file manifest
pub const PER_FILE_SUFFIX: &str = "_metadata.json";

/// Records accumulated over one run, keyed by filename
///
/// Iteration is ordered by filename, so serialization does not depend on the
/// order files finished in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CombinedManifest {
    records: BTreeMap<String, AudioMetadataRecord>,
}

impl CombinedManifest {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record; an existing record for `filename` is replaced and returned
    pub fn insert(
        &mut self,
        filename: impl Into<String>,
        record: AudioMetadataRecord,
    ) -> Option<AudioMetadataRecord> {
        self.records.insert(filename.into(), record)
    }

    /// Record for `filename`
    pub fn get(&self, filename: &str) -> Option<&AudioMetadataRecord> {
        self.records.get(filename)
    }

    /// True if `filename` has a record
    pub fn contains(&self, filename: &str) -> bool {
        self.records.contains_key(filename)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no records were accumulated
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Filenames in manifest order
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// (filename, record) pairs in manifest order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AudioMetadataRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Reads and writes the manifests of one folder
#[derive(Debug, Clone)]
pub struct ManifestStore {
    folder: PathBuf,
}

impl ManifestStore {
    /// Store rooted at `folder`
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Folder manifests are written to
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Path of the per-file manifest for `filename`
    pub fn per_file_path(&self, filename: &str) -> PathBuf {
        self.folder.join(format!("{}{}", filename, PER_FILE_SUFFIX))
    }

    /// Path of the combined manifest
    pub fn combined_path(&self) -> PathBuf {
        self.folder.join(COMBINED_MANIFEST_NAME)
    }

    /// Write `{filename: record}`, replacing any existing document
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Persistence` if the folder is not writable
    pub fn write_per_file(
        &self,
        filename: &str,
        record: &AudioMetadataRecord,
    ) -> Result<PathBuf, CatalogError> {
        let mut doc = BTreeMap::new();
        doc.insert(filename, record);
        let path = self.per_file_path(filename);
        write_document(&self.folder, &path, &doc)?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Write the whole run's records, replacing any existing document
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Persistence` if the folder is not writable
    pub fn write_combined(&self, manifest: &CombinedManifest) -> Result<PathBuf, CatalogError> {
        let path = self.combined_path();
        write_document(&self.folder, &path, manifest)?;
        log::debug!("Wrote {} ({} records)", path.display(), manifest.len());
        Ok(path)
    }

    /// Load the per-file manifest of `filename`
    pub fn read_per_file(
        &self,
        filename: &str,
    ) -> Result<BTreeMap<String, AudioMetadataRecord>, CatalogError> {
        read_document(&self.per_file_path(filename))
    }

    /// Load the combined manifest
    pub fn read_combined(&self) -> Result<CombinedManifest, CatalogError> {
        read_document(&self.combined_path())
    }

    /// Remove the per-file manifest of `filename` if it exists
    pub fn remove_per_file(&self, filename: &str) -> Result<(), CatalogError> {
        let path = self.per_file_path(filename);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CatalogError::persistence(path, e)),
        }
    }
}

/// Serialize `value` with 4-space indentation
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CatalogError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

fn write_document<T: Serialize + ?Sized>(
    folder: &Path,
    path: &Path,
    value: &T,
) -> Result<(), CatalogError> {
    let bytes = to_pretty_json(value)?;

    let mut tmp =
        NamedTempFile::new_in(folder).map_err(|e| CatalogError::persistence(path, e))?;
    tmp.write_all(&bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| CatalogError::persistence(path, e))?;
    set_document_permissions(tmp.as_file(), path)?;
    tmp.persist(path)
        .map_err(|e| CatalogError::persistence(path, e.error))?;
    Ok(())
}

/// Temporary files are created owner-only; give the document the mode of the file it
/// replaces, or 0644 when it is new.
#[cfg(unix)]
fn set_document_permissions(file: &std::fs::File, path: &Path) -> Result<(), CatalogError> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = match std::fs::metadata(path) {
        Ok(existing) => existing.permissions(),
        Err(_) => std::fs::Permissions::from_mode(0o644),
    };
    file.set_permissions(permissions)
        .map_err(|e| CatalogError::persistence(path, e))
}

#[cfg(not(unix))]
fn set_document_permissions(_file: &std::fs::File, _path: &Path) -> Result<(), CatalogError> {
    Ok(())
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
