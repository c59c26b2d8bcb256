//! # Stratum Catalog
//!
//! Offline cataloging for a sound-asset library: every audio file in a folder
//! gets a tempo, a musical key and a set of spectral descriptors, persisted as
//! JSON manifests and echoed into the file's own tags.
//!
//! ## Features
//!
//! - **Tempo**: aubio, with scoped ffmpeg conversion for non-WAV input
//! - **Key**: chroma argmax for the root, harmonic tonnetz for major/minor
//! - **Spectral descriptors**: centroid, bandwidth, zero-crossing rate, chroma energy, MFCC
//! - **Manifests**: one document per file plus one combined document per run
//! - **Tags**: integer tempo and comment written through lofty
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use stratum_catalog::{catalog_folder, CatalogConfig};
//!
//! let report = catalog_folder(Path::new("samples/"), CatalogConfig::default())?;
//!
//! println!("Cataloged {} files", report.cataloged.len());
//! for skipped in &report.skipped {
//!     println!("Skipped {}: {}", skipped.filename, skipped.reason);
//! }
//! # Ok::<(), stratum_catalog::CatalogError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Folder scan → Decode → {Tempo, Key, Spectral} → Record → {Per-file manifest, Tags} → Combined manifest
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

use std::path::Path;

// Re-export main types
pub use analysis::manifest::{CombinedManifest, ManifestStore};
pub use analysis::result::{AudioMetadataRecord, Key, Loopable};
pub use catalog::{Cataloger, FileOutcome, RunReport, SkippedFile};
pub use config::CatalogConfig;
pub use error::CatalogError;
pub use features::spectral::SpectralSummary;

/// Catalog a folder with the default analysis stages
///
/// # Arguments
///
/// * `folder` - Folder to scan (top level only)
/// * `config` - Catalog configuration
///
/// # Returns
///
/// `RunReport` listing cataloged and skipped files and the combined manifest location
///
/// # Errors
///
/// Returns `CatalogError` if the folder cannot be scanned or the combined manifest
/// cannot be written. Per-file failures never abort the run.
pub fn catalog_folder(folder: &Path, config: CatalogConfig) -> Result<RunReport, CatalogError> {
    log::debug!("Starting catalog run in {}", folder.display());
    Cataloger::from_config(config).run(folder)
}
