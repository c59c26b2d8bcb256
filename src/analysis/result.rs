//! Catalog record types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::spectral::SpectralSummary;

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

/// Pitch class names, sharps only
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Key {
    /// Get key name in musical notation (e.g., "C", "Am", "F#", "D#m")
    ///
    /// Returns standard musical notation:
    /// - Major keys: note name only (e.g., "C", "C#", "D", "F#")
    /// - Minor keys: note name + "m" (e.g., "Am", "C#m", "Dm", "F#m")
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_catalog::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C");
    /// assert_eq!(Key::Major(6).name(), "F#");
    /// assert_eq!(Key::Minor(9).name(), "Am");
    /// assert_eq!(Key::Minor(1).name(), "C#m");
    /// ```
    pub fn name(&self) -> String {
        match self {
            Key::Major(i) => PITCH_CLASSES[*i as usize % 12].to_string(),
            Key::Minor(i) => format!("{}m", PITCH_CLASSES[*i as usize % 12]),
        }
    }

    /// Root pitch class (0 = C)
    pub fn root(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// Parse a label produced by [`Key::name`]
    pub fn from_name(label: &str) -> Option<Self> {
        let (note, minor) = match label.strip_suffix('m') {
            Some(note) => (note, true),
            None => (label, false),
        };
        let root = PITCH_CLASSES.iter().position(|&n| n == note)? as u32;
        Some(if minor { Key::Minor(root) } else { Key::Major(root) })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Whether a file loops cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Loopable {
    /// Loops cleanly
    Yes,
    /// Does not loop
    No,
    /// Not determined
    #[default]
    Unknown,
}

/// Metadata record for one audio file
///
/// Field order is the manifest key order. Spectral fields are absent from the
/// serialized form when feature extraction failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadataRecord {
    /// Estimated tempo; passed through unvalidated
    #[serde(rename = "BPM")]
    pub bpm: f32,

    /// Free-text annotation
    #[serde(rename = "Description")]
    pub description: String,

    /// Loop flag
    #[serde(rename = "IfItLoops", default)]
    pub loopable: Loopable,

    /// Key label, e.g. "C" or "A#m"
    #[serde(rename = "Key")]
    pub key: String,

    /// Spectral descriptors, `None` when extraction failed
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub features: Option<SpectralSummary>,
}

impl AudioMetadataRecord {
    /// True if spectral descriptors are present
    pub fn has_features(&self) -> bool {
        self.features.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_name_major() {
        assert_eq!(Key::Major(0).name(), "C");
        assert_eq!(Key::Major(1).name(), "C#");
        assert_eq!(Key::Major(6).name(), "F#");
        assert_eq!(Key::Major(11).name(), "B");
    }

    #[test]
    fn test_key_name_minor() {
        assert_eq!(Key::Minor(0).name(), "Cm");
        assert_eq!(Key::Minor(10).name(), "A#m");
        assert_eq!(Key::Minor(9).to_string(), "Am");
    }

    #[test]
    fn test_key_from_name() {
        for i in 0..12 {
            assert_eq!(Key::from_name(&Key::Major(i).name()), Some(Key::Major(i)));
            assert_eq!(Key::from_name(&Key::Minor(i).name()), Some(Key::Minor(i)));
        }
        assert_eq!(Key::from_name("H"), None);
        assert_eq!(Key::from_name(""), None);
    }

    #[test]
    fn test_record_key_order_without_features() {
        let record = AudioMetadataRecord {
            bpm: 120.0,
            description: "N/A".to_string(),
            loopable: Loopable::Unknown,
            key: "Dm".to_string(),
            features: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"BPM":120.0,"Description":"N/A","IfItLoops":"Unknown","Key":"Dm"}"#
        );
    }

    #[test]
    fn test_record_with_features_roundtrip() {
        let record = AudioMetadataRecord {
            bpm: 98.5,
            description: "N/A".to_string(),
            loopable: Loopable::Yes,
            key: "G".to_string(),
            features: Some(SpectralSummary {
                length: 4.0,
                spectral_centroid: 1500.0,
                spectral_bandwidth: 900.0,
                zero_crossing_rate: 0.05,
                chroma_energy: 0.4,
                mfcc_summary: -12.5,
            }),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with(r#"{"BPM":98.5,"Description":"N/A","IfItLoops":"Yes","Key":"G","Length":4.0"#));
        assert!(json.ends_with(r#""ChromaSTFT":0.4,"MFCC":-12.5}"#));

        let back: AudioMetadataRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
