//! Tag write-back
//!
//! Echoes the tempo (as an integer) and the description (as a comment) into the
//! audio file's embedded tag container.

use std::path::Path;

use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::tag::{ItemKey, Tag, TagType};

use crate::analysis::result::AudioMetadataRecord;
use crate::error::CatalogError;

/// Fields written into a tag container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUpdate {
    /// Integer tempo
    pub tempo: u32,
    /// Comment text
    pub comment: String,
}

impl TagUpdate {
    /// Tag fields derived from a record
    pub fn from_record(record: &AudioMetadataRecord) -> Self {
        Self {
            tempo: bpm_to_tag_tempo(record.bpm),
            comment: record.description.clone(),
        }
    }
}

/// Truncate a tempo estimate toward zero; negative and NaN estimates become 0
pub fn bpm_to_tag_tempo(bpm: f32) -> u32 {
    if bpm.is_finite() && bpm > 0.0 {
        bpm.trunc() as u32
    } else {
        0
    }
}

/// Persists tag fields into an audio file
pub trait TagWriter: Send + Sync {
    /// Write `update` into the file at `path`
    ///
    /// # Returns
    ///
    /// `Ok(false)` if the file has no loadable tag container and nothing was written
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Persistence` if the container was loaded but the tempo could
    /// not be stored or the file could not be saved
    fn write(&self, path: &Path, update: &TagUpdate) -> Result<bool, CatalogError>;
}

/// lofty-backed tag writer
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagWriter;

impl TagWriter for LoftyTagWriter {
    fn write(&self, path: &Path, update: &TagUpdate) -> Result<bool, CatalogError> {
        let mut tagged_file = match lofty::read_from_path(path) {
            Ok(file) => file,
            Err(e) => {
                log::debug!("No tag container for {}: {}", path.display(), e);
                return Ok(false);
            }
        };

        // Primary tag type only; secondary containers such as RIFF INFO have no tempo field
        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            log::debug!("Creating {:?} tag for {}", tag_type, path.display());
            tagged_file.insert_tag(Tag::new(tag_type));
        }

        let Some(tag) = tagged_file.tag_mut(tag_type) else {
            return Err(CatalogError::persistence(path, "no writable tag"));
        };

        if !tag.insert_text(ItemKey::IntegerBpm, update.tempo.to_string()) {
            return Err(CatalogError::persistence(
                path,
                format!("{:?} tag cannot store a tempo", tag_type),
            ));
        }
        tag.set_comment(update.comment.clone());

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|e| CatalogError::persistence(path, e))?;

        log::debug!(
            "Tagged {}: tempo={} comment={:?}",
            path.display(),
            update.tempo,
            update.comment
        );
        Ok(true)
    }
}

/// Read back the tempo and comment fields written by [`LoftyTagWriter`]
///
/// Only the format's primary tag type is consulted. Returns `Ok(None)` if the file
/// has no loadable tag container or no primary tag.
pub fn read_tag_update(path: &Path) -> Result<Option<TagUpdate>, CatalogError> {
    let tagged_file = match lofty::read_from_path(path) {
        Ok(file) => file,
        Err(_) => return Ok(None),
    };
    let Some(tag) = tagged_file.tag(tagged_file.primary_tag_type()) else {
        return Ok(None);
    };

    let tempo = tag
        .get_string(&ItemKey::IntegerBpm)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(0);
    let comment = tag.comment().map(|c| c.into_owned()).unwrap_or_default();
    Ok(Some(TagUpdate { tempo, comment }))
}
