// Temporal module - Time-domain feature extraction
//
// Statistics of the instantaneous magnitude |x[n]| of a complex capture,
// plus power and energy intensity. All statistics are population statistics
// (divide by N).

use rustfft::num_complex::Complex32;

/// Time-domain statistics of one capture
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemporalStats {
    pub mean: f64,
    pub std_dev: f64,
    pub rms: f64,
    pub peak: f64,
    pub crest_factor: f64,
    pub power_intensity: f64,
    pub energy_intensity: f64,
}

/// Compute magnitude statistics and intensities
///
/// Crest factor is defined as 0 when RMS is 0 (all-zero capture) so the
/// result is always finite. An empty slice yields all zeros.
pub fn compute_temporal(samples: &[Complex32]) -> TemporalStats {
    if samples.is_empty() {
        return TemporalStats::default();
    }

    let n = samples.len() as f64;
    let magnitudes: Vec<f64> = samples
        .iter()
        .map(|s| (s.re as f64).hypot(s.im as f64))
        .collect();

    let mean = magnitudes.iter().sum::<f64>() / n;
    let energy: f64 = magnitudes.iter().map(|m| m * m).sum();
    let power = energy / n;
    let variance = magnitudes.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / n;
    let peak = magnitudes.iter().cloned().fold(0.0, f64::max);
    let rms = power.sqrt();

    let crest_factor = if rms > 0.0 { peak / rms } else { 0.0 };

    TemporalStats {
        mean,
        std_dev: variance.sqrt(),
        rms,
        peak,
        crest_factor,
        power_intensity: power,
        energy_intensity: energy,
    }
}
