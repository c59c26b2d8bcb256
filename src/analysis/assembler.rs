//! Record assembly
//!
//! Merges estimator outputs into one [`AudioMetadataRecord`]. The defaults
//! (tempo, description, loop flag, key) come first and the spectral descriptors
//! are overlaid on top; the two sets never share a field. Values are not
//! validated: a negative or absurd tempo is carried through as given.

use crate::analysis::result::{AudioMetadataRecord, Loopable};
use crate::features::spectral::SpectralSummary;

/// Builds records with a fixed description sentinel
#[derive(Debug, Clone)]
pub struct MetadataAssembler {
    description: String,
}

impl MetadataAssembler {
    /// Create an assembler that fills `description` into every record
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// Description sentinel used for new records
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Assemble one record
    ///
    /// # Arguments
    ///
    /// * `bpm` - Tempo estimate, unvalidated
    /// * `key` - Key label
    /// * `features` - Spectral descriptors, `None` when extraction failed
    pub fn assemble(
        &self,
        bpm: f32,
        key: &str,
        features: Option<SpectralSummary>,
    ) -> AudioMetadataRecord {
        assemble_record(bpm, key, features, &self.description)
    }
}

/// Merge defaults and spectral descriptors into a record
pub fn assemble_record(
    bpm: f32,
    key: &str,
    features: Option<SpectralSummary>,
    description: &str,
) -> AudioMetadataRecord {
    AudioMetadataRecord {
        bpm,
        description: description.to_string(),
        loopable: Loopable::Unknown,
        key: key.to_string(),
        features,
    }
}
