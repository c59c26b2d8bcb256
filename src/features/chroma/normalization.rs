//! Chroma normalization strategies

/// Numerical stability floor
const EPSILON: f32 = 1e-10;

/// Scale a chroma vector so its largest element is 1.0 (L-infinity norm)
///
/// Silent frames (all values below `EPSILON`) are left untouched.
pub fn normalize_max(chroma: &mut [f32]) {
    let max = chroma.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    if max > EPSILON {
        for x in chroma.iter_mut() {
            *x /= max;
        }
    }
}

/// Scale a chroma vector so its elements sum to 1.0 (L1 norm)
pub fn normalize_sum(chroma: &mut [f32]) {
    let sum: f32 = chroma.iter().map(|x| x.abs()).sum();
    if sum > EPSILON {
        for x in chroma.iter_mut() {
            *x /= sum;
        }
    }
}
