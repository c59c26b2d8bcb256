//! Key detection policy
//!
//! 1. Root: index of the largest time-averaged chroma energy (lowest index wins ties)
//! 2. Quality: minor iff the mean of the tonnetz minor-third axis is strictly greater
//!    than the mean of the reference axis (tonnetz row 4); equal means are major

use super::tonal::TonalFeatureProvider;
use crate::analysis::result::Key;
use crate::error::CatalogError;
use crate::features::chroma::mean_chroma;
use crate::features::tonnetz::N_TONNETZ;
use crate::io::DecodedAudio;

/// Tonnetz row holding the minor-third x component
pub const MINOR_THIRD_AXIS: usize = 2;

/// Tonnetz row the minor-third axis is compared against (major-third x component)
pub const REFERENCE_AXIS: usize = 4;

/// Root pitch class (0 = C, ..., 11 = B) of a chromagram
///
/// # Errors
///
/// Returns `CatalogError::Estimation` for empty or malformed chroma
pub fn root_pitch_class(chroma_vectors: &[Vec<f32>]) -> Result<u32, CatalogError> {
    let mean = mean_chroma(chroma_vectors).map_err(into_estimation)?;

    let mut best = 0usize;
    for (i, &energy) in mean.iter().enumerate().skip(1) {
        if energy > mean[best] {
            best = i;
        }
    }
    Ok(best as u32)
}

/// Time average of each tonnetz axis
///
/// # Errors
///
/// Returns `CatalogError::Estimation` for empty input or frames that are not 6 elements
pub fn axis_means(tonnetz: &[Vec<f32>]) -> Result<[f32; N_TONNETZ], CatalogError> {
    if tonnetz.is_empty() {
        return Err(CatalogError::Estimation("Empty tonnetz".to_string()));
    }

    let mut means = [0.0f32; N_TONNETZ];
    for (i, frame) in tonnetz.iter().enumerate() {
        if frame.len() != N_TONNETZ {
            return Err(CatalogError::Estimation(format!(
                "Tonnetz frame {} has {} elements, expected {}",
                i,
                frame.len(),
                N_TONNETZ
            )));
        }
        for (m, &v) in means.iter_mut().zip(frame) {
            *m += v;
        }
    }

    let n = tonnetz.len() as f32;
    for m in means.iter_mut() {
        *m /= n;
    }
    Ok(means)
}

/// True if the tonnetz indicates minor quality
pub fn is_minor(tonnetz: &[Vec<f32>]) -> Result<bool, CatalogError> {
    let means = axis_means(tonnetz)?;
    Ok(means[MINOR_THIRD_AXIS] > means[REFERENCE_AXIS])
}

/// Classify a key from precomputed chroma and tonnetz
///
/// # Example
///
/// ```
/// use stratum_catalog::features::key::classify_key;
///
/// let mut chroma = vec![0.1f32; 12];
/// chroma[9] = 1.0; // A
/// let tonnetz = vec![vec![0.0, 0.0, 0.4, 0.0, 0.2, 0.0]];
/// let key = classify_key(&[chroma], &tonnetz)?;
/// assert_eq!(key.name(), "Am");
/// # Ok::<(), stratum_catalog::CatalogError>(())
/// ```
pub fn classify_key(
    chroma_vectors: &[Vec<f32>],
    tonnetz: &[Vec<f32>],
) -> Result<Key, CatalogError> {
    let root = root_pitch_class(chroma_vectors)?;
    if is_minor(tonnetz)? {
        Ok(Key::Minor(root))
    } else {
        Ok(Key::Major(root))
    }
}

fn into_estimation(err: CatalogError) -> CatalogError {
    match err {
        CatalogError::InvalidInput(msg) => CatalogError::Estimation(msg),
        other => other,
    }
}

/// Key estimator over a tonal feature provider
///
/// Performs no recovery: provider failures propagate to the caller.
pub struct KeyEstimator {
    provider: Box<dyn TonalFeatureProvider>,
}

impl KeyEstimator {
    /// Create an estimator over `provider`
    pub fn new(provider: Box<dyn TonalFeatureProvider>) -> Self {
        Self { provider }
    }

    /// Estimate the key of `audio`
    pub fn estimate(&self, audio: &DecodedAudio) -> Result<Key, CatalogError> {
        log::debug!(
            "Estimating key: {} samples at {} Hz",
            audio.samples.len(),
            audio.sample_rate
        );

        let chroma = self.provider.chroma(audio).map_err(into_estimation)?;
        let tonnetz = self.provider.harmonic_tonnetz(audio).map_err(into_estimation)?;
        let key = classify_key(&chroma, &tonnetz)?;

        log::debug!("Detected key: {}", key.name());
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chroma_peak(index: usize) -> Vec<Vec<f32>> {
        let mut c = vec![0.2f32; 12];
        c[index] = 1.0;
        vec![c; 4]
    }

    fn tonnetz_with(minor_third: f32, reference: f32) -> Vec<Vec<f32>> {
        let mut t = vec![0.0f32; 6];
        t[MINOR_THIRD_AXIS] = minor_third;
        t[REFERENCE_AXIS] = reference;
        vec![t; 4]
    }

    #[test]
    fn test_major_when_reference_dominates() {
        let key = classify_key(&chroma_peak(0), &tonnetz_with(0.1, 0.3)).unwrap();
        assert_eq!(key, Key::Major(0));
        assert_eq!(key.name(), "C");
    }

    #[test]
    fn test_minor_when_minor_third_dominates() {
        let key = classify_key(&chroma_peak(0), &tonnetz_with(0.4, 0.2)).unwrap();
        assert_eq!(key.name(), "Cm");
    }

    #[test]
    fn test_fifths_rows_do_not_affect_quality() {
        assert_eq!(REFERENCE_AXIS, 4);
        let mut frame = vec![0.0f32; 6];
        frame[0] = 0.9;
        frame[1] = 0.9;
        frame[MINOR_THIRD_AXIS] = 0.3;
        frame[REFERENCE_AXIS] = 0.1;
        let key = classify_key(&chroma_peak(0), &vec![frame; 4]).unwrap();
        assert_eq!(key.name(), "Cm");
    }

    #[test]
    fn test_tie_is_major() {
        let key = classify_key(&chroma_peak(10), &tonnetz_with(0.25, 0.25)).unwrap();
        assert_eq!(key, Key::Major(10));
        assert_eq!(key.name(), "A#");
    }

    #[test]
    fn test_root_tie_takes_lowest_index() {
        let mut c = vec![0.0f32; 12];
        c[4] = 0.8;
        c[7] = 0.8;
        assert_eq!(root_pitch_class(&[c]).unwrap(), 4);
        assert_eq!(root_pitch_class(&[vec![0.5; 12]]).unwrap(), 0);
    }

    #[test]
    fn test_root_uses_time_average() {
        let mut a = vec![0.0f32; 12];
        a[2] = 1.0;
        let mut b = vec![0.0f32; 12];
        b[5] = 0.6;
        // D peaks in one frame, F is steady across three
        let frames = vec![a, b.clone(), b.clone(), b];
        assert_eq!(root_pitch_class(&frames).unwrap(), 5);
    }

    #[test]
    fn test_deterministic() {
        let chroma = chroma_peak(3);
        let tonnetz = tonnetz_with(0.31, 0.3);
        let first = classify_key(&chroma, &tonnetz).unwrap();
        for _ in 0..5 {
            assert_eq!(classify_key(&chroma, &tonnetz).unwrap(), first);
        }
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(root_pitch_class(&[]), Err(CatalogError::Estimation(_))));
        assert!(axis_means(&[vec![0.0; 5]]).is_err());
        assert!(is_minor(&[]).is_err());
    }

    struct FailingProvider;

    impl TonalFeatureProvider for FailingProvider {
        fn chroma(&self, _audio: &DecodedAudio) -> Result<Vec<Vec<f32>>, CatalogError> {
            Ok(chroma_peak(0))
        }

        fn harmonic_tonnetz(&self, _audio: &DecodedAudio) -> Result<Vec<Vec<f32>>, CatalogError> {
            Err(CatalogError::Estimation("separation failed".to_string()))
        }
    }

    #[test]
    fn test_provider_failure_propagates() {
        let estimator = KeyEstimator::new(Box::new(FailingProvider));
        let audio = DecodedAudio::new(vec![0.0; 100], 22050);
        assert!(matches!(
            estimator.estimate(&audio),
            Err(CatalogError::Estimation(_))
        ));
    }
}
