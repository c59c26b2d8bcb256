//! Error types for the cataloging pipeline

use std::path::PathBuf;

/// Errors that can occur while cataloging an audio folder
///
/// `Decode`, `Estimation` and `FeatureExtraction` are file-level: they only ever
/// skip the file being processed. `FeatureExtraction` is normally absorbed by the
/// pipeline and replaced by an empty feature set.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Unreadable, corrupt or unsupported audio input
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Tempo or key estimator failure, including external process failures
    #[error("Estimation error: {0}")]
    Estimation(String),

    /// Spectral feature extraction failure
    #[error("Feature extraction error: {0}")]
    FeatureExtraction(String),

    /// Manifest or tag write failure
    #[error("Persistence error at {path}: {reason}")]
    Persistence {
        /// Target that could not be written
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File system error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Manifest (de)serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    /// Build a persistence error for `path`
    pub fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CatalogError::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that only affect the file being processed
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            CatalogError::Decode(_)
                | CatalogError::Estimation(_)
                | CatalogError::FeatureExtraction(_)
                | CatalogError::InvalidInput(_)
        )
    }
}
