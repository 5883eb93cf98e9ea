// Spectral module - Frequency-domain feature extraction
//
// Peak frequency, centroid and bandwidth are computed from the Welch PSD;
// the grid statistics are computed over every cell of the log-power
// spectrogram.

use crate::analysis::spectral::{Psd, SpectrogramFrame};

/// Total PSD power below which peak, centroid and bandwidth are reported as 0
const MIN_TOTAL_POWER: f64 = 1e-30;

/// PSD-derived statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PsdStats {
    pub peak_frequency: f64,
    pub centroid: f64,
    pub bandwidth: f64,
}

/// Statistics over the full spectrogram grid (dB)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectrogramStats {
    pub mean: f64,
    pub std_dev: f64,
    pub max: f64,
    pub sum: f64,
}

/// Compute peak frequency, centroid and bandwidth
///
/// Formula: centroid = Σ(f_i × P_i) / ΣP_i,
/// bandwidth = sqrt(Σ((f_i - centroid)² × P_i) / ΣP_i)
///
/// The first bin wins ties for the peak. A PSD with no power (silent
/// capture) reports 0 Hz (DC) for peak, centroid and bandwidth.
///
/// The centroid is an arithmetic mean over the shifted two-sided axis, so it
/// tracks a single tone only while the tone's Hann main lobe (one bin either
/// side) stays inside [-fs/2, fs/2). For a tone within one bin of ±fs/2 the
/// lobe wraps onto the opposite edge and pulls the centroid toward 0.
pub fn compute_psd_stats(psd: &Psd) -> PsdStats {
    let total: f64 = psd.power.iter().sum();
    if total < MIN_TOTAL_POWER {
        return PsdStats::default();
    }

    let mut peak_idx = 0;
    let mut peak_power = f64::NEG_INFINITY;
    for (i, &p) in psd.power.iter().enumerate() {
        if p > peak_power {
            peak_power = p;
            peak_idx = i;
        }
    }
    let peak_frequency = psd.frequencies.get(peak_idx).copied().unwrap_or(0.0);

    let centroid = psd
        .frequencies
        .iter()
        .zip(psd.power.iter())
        .map(|(f, p)| f * p)
        .sum::<f64>()
        / total;

    let spread = psd
        .frequencies
        .iter()
        .zip(psd.power.iter())
        .map(|(f, p)| (f - centroid).powi(2) * p)
        .sum::<f64>()
        / total;

    PsdStats {
        peak_frequency,
        centroid,
        bandwidth: spread.max(0.0).sqrt(),
    }
}

/// Compute mean, standard deviation, max and sum over all log-power cells
pub fn compute_spectrogram_stats(frame: &SpectrogramFrame) -> SpectrogramStats {
    let values = frame.values();
    if values.is_empty() {
        return SpectrogramStats::default();
    }

    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let mean = sum / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    SpectrogramStats {
        mean,
        std_dev: variance.sqrt(),
        max,
        sum,
    }
}
