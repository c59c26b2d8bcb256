//! Mel-frequency cepstral coefficients
//!
//! Slaney-style mel filterbank (area-normalized triangles), log power in dB with
//! an 80 dB floor below the spectrogram peak, then an orthonormal DCT-II per frame.

/// Dynamic range kept by the log-mel spectrogram
const TOP_DB: f32 = 80.0;

/// Power floor before taking logs
const AMIN: f32 = 1e-10;

/// Convert frequency in Hz to the Slaney mel scale (linear below 1 kHz, log above)
pub fn hz_to_mel(hz: f32) -> f32 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let logstep = 6.4f32.ln() / 27.0;
    if hz < min_log_hz {
        hz / f_sp
    } else {
        min_log_hz / f_sp + (hz / min_log_hz).ln() / logstep
    }
}

/// Inverse of `hz_to_mel`
pub fn mel_to_hz(mel: f32) -> f32 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = 6.4f32.ln() / 27.0;
    if mel < min_log_mel {
        mel * f_sp
    } else {
        min_log_hz * (logstep * (mel - min_log_mel)).exp()
    }
}

/// Build a mel filterbank covering 0 Hz to Nyquist
///
/// # Returns
///
/// `n_mels` rows of `frame_size / 2 + 1` weights
pub fn mel_filterbank(sample_rate: u32, frame_size: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let n_bins = frame_size / 2 + 1;
    if n_mels == 0 || frame_size == 0 {
        return vec![vec![0.0; n_bins]; n_mels];
    }

    let mel_max = hz_to_mel(sample_rate as f32 / 2.0);
    let step = mel_max / (n_mels + 1) as f32;
    let edges: Vec<f32> = (0..n_mels + 2).map(|i| mel_to_hz(step * i as f32)).collect();
    let bin_freqs: Vec<f32> = (0..n_bins)
        .map(|k| k as f32 * sample_rate as f32 / frame_size as f32)
        .collect();

    (0..n_mels)
        .map(|m| {
            let (lo, centre, hi) = (edges[m], edges[m + 1], edges[m + 2]);
            let enorm = 2.0 / (hi - lo).max(1e-8);
            bin_freqs
                .iter()
                .map(|&f| {
                    let rising = (f - lo) / (centre - lo).max(1e-8);
                    let falling = (hi - f) / (hi - centre).max(1e-8);
                    rising.min(falling).max(0.0) * enorm
                })
                .collect()
        })
        .collect()
}

/// Orthonormal DCT-II, keeping the first `n_out` coefficients
pub fn dct_type_ii(x: &[f32], n_out: usize) -> Vec<f32> {
    let n = x.len() as f32;
    if x.is_empty() {
        return vec![0.0; n_out];
    }
    (0..n_out)
        .map(|k| {
            let sum: f32 = x
                .iter()
                .enumerate()
                .map(|(i, v)| v * (std::f32::consts::PI / n * (i as f32 + 0.5) * k as f32).cos())
                .sum();
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            sum * scale
        })
        .collect()
}

/// Compute MFCCs from a power spectrogram
///
/// # Arguments
///
/// * `power` - Power spectrogram, frame-major
/// * `sample_rate` - Sample rate in Hz
/// * `frame_size` - FFT size the spectrogram was computed with
/// * `n_mfcc` - Coefficients per frame
/// * `n_mels` - Mel bands
///
/// # Returns
///
/// One `n_mfcc`-element coefficient vector per frame
pub fn mfcc_from_power(
    power: &[Vec<f32>],
    sample_rate: u32,
    frame_size: usize,
    n_mfcc: usize,
    n_mels: usize,
) -> Vec<Vec<f32>> {
    let filterbank = mel_filterbank(sample_rate, frame_size, n_mels);

    let log_mel: Vec<Vec<f32>> = power
        .iter()
        .map(|frame| {
            filterbank
                .iter()
                .map(|row| {
                    let energy: f32 = row.iter().zip(frame).map(|(w, p)| w * p).sum();
                    10.0 * energy.max(AMIN).log10()
                })
                .collect()
        })
        .collect();

    let peak = log_mel
        .iter()
        .flatten()
        .cloned()
        .fold(f32::NEG_INFINITY, f32::max);
    let floor = peak - TOP_DB;

    log_mel
        .into_iter()
        .map(|mut frame| {
            for v in frame.iter_mut() {
                *v = v.max(floor);
            }
            dct_type_ii(&frame, n_mfcc)
        })
        .collect()
}
