// STFT module - windowed segment framing and FFT
//
// This module frames a complex capture into non-overlapping segments,
// applies detrending and a periodic Hann window, and computes the
// density-scaled power of every segment. Both the Welch PSD and the
// spectrogram are built from these per-segment power columns.

use std::sync::Arc;

use rustfft::num_complex::{Complex32, Complex64};
use rustfft::{Fft, FftPlanner};

use crate::config::Detrend;

/// Power below this value is treated as zero when converting to dB
pub const POWER_FLOOR: f64 = 1e-20;

/// Log-power assigned to floored bins (10 * log10(POWER_FLOOR))
pub const POWER_FLOOR_DB: f64 = -200.0;

/// Convert linear power to dB, flooring non-positive and tiny values
pub fn power_to_db(power: f64) -> f64 {
    if power > POWER_FLOOR {
        10.0 * power.log10()
    } else {
        POWER_FLOOR_DB
    }
}

/// Periodic Hann window (a length-1 window is the identity)
pub fn hann_window(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / len as f64).cos())
        .collect()
}

/// Per-segment power spectra of one capture
#[derive(Debug, Clone)]
pub struct StftFrames {
    /// Samples per segment actually used (shrinks for short captures)
    pub segment_len: usize,
    /// FFT size (number of frequency bins)
    pub fft_size: usize,
    /// One density-scaled power column per segment, ascending frequency order
    pub columns: Vec<Vec<f64>>,
}

/// Frames complex samples and computes per-segment power spectra
pub struct StftProcessor {
    fft: Arc<dyn Fft<f64>>,
    fft_size: usize,
    segment_len: usize,
    detrend: Detrend,
    /// Pre-computed window for full-length segments
    window: Vec<f64>,
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `segment_len` - Samples per segment (512 for feature extraction)
    /// * `fft_size` - FFT size, at least `segment_len`
    /// * `detrend` - Detrending applied to each segment before windowing
    pub fn new(segment_len: usize, fft_size: usize, detrend: Detrend) -> Self {
        let segment_len = segment_len.max(1);
        let fft_size = fft_size.max(segment_len);
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        Self {
            fft,
            fft_size,
            segment_len,
            detrend,
            window: hann_window(segment_len),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Compute the power of every zero-overlap segment
    ///
    /// Segments are taken back to back and a trailing partial segment is
    /// dropped. A capture shorter than the configured segment length is
    /// analysed as a single segment of its own length, zero padded to the
    /// FFT size, so any non-empty capture yields at least one column.
    ///
    /// # Arguments
    /// * `samples` - Complex capture samples
    /// * `sample_rate` - Sample rate in Hz, used for density scaling
    pub fn frame_power(&self, samples: &[Complex32], sample_rate: f64) -> StftFrames {
        let segment_len = self.segment_len.min(samples.len()).max(1);
        let short_window;
        let window = if segment_len == self.segment_len {
            &self.window
        } else {
            short_window = hann_window(segment_len);
            &short_window
        };

        let window_power: f64 = window.iter().map(|w| w * w).sum();
        let scale = 1.0 / (sample_rate * window_power);
        let num_segments = samples.len() / segment_len;

        let mut buffer = vec![Complex64::new(0.0, 0.0); self.fft_size];
        let mut columns = Vec::with_capacity(num_segments);

        for segment in samples.chunks_exact(segment_len) {
            let mean = match self.detrend {
                Detrend::None => Complex64::new(0.0, 0.0),
                Detrend::Constant => {
                    segment
                        .iter()
                        .map(|s| Complex64::new(s.re as f64, s.im as f64))
                        .sum::<Complex64>()
                        / segment_len as f64
                }
            };

            for (slot, (sample, w)) in buffer.iter_mut().zip(segment.iter().zip(window.iter())) {
                *slot = (Complex64::new(sample.re as f64, sample.im as f64) - mean) * *w;
            }
            for slot in buffer[segment_len..].iter_mut() {
                *slot = Complex64::new(0.0, 0.0);
            }

            self.fft.process(&mut buffer);

            let power: Vec<f64> = buffer.iter().map(|x| x.norm_sqr() * scale).collect();
            columns.push(fft_shift(&power));
        }

        StftFrames {
            segment_len,
            fft_size: self.fft_size,
            columns,
        }
    }
}

/// Frequency of each bin after [`fft_shift`], ascending from -fs/2
pub fn shifted_frequencies(fft_size: usize, sample_rate: f64) -> Vec<f64> {
    let half = (fft_size / 2) as f64;
    let bin_width = sample_rate / fft_size as f64;
    (0..fft_size)
        .map(|k| (k as f64 - half) * bin_width)
        .collect()
}

/// Reorder FFT output so bins run from the most negative frequency upward
fn fft_shift(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let positive = (n - 1) / 2 + 1;
    (0..n).map(|k| values[(k + positive) % n]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window_is_periodic() {
        let window = hann_window(4);
        let expected = [0.0, 0.5, 1.0, 0.5];
        for (w, e) in window.iter().zip(expected.iter()) {
            assert!((w - e).abs() < 1e-12);
        }
        assert_eq!(hann_window(1), vec![1.0]);
    }

    #[test]
    fn test_power_to_db_floors_zero() {
        assert_eq!(power_to_db(0.0), POWER_FLOOR_DB);
        assert_eq!(power_to_db(-1.0), POWER_FLOOR_DB);
        assert!((power_to_db(100.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_fft_shift_orders_frequencies() {
        // FFT order for n = 4: [0, 1, -2, -1]
        assert_eq!(fft_shift(&[0.0, 1.0, -2.0, -1.0]), vec![-2.0, -1.0, 0.0, 1.0]);
        // n = 5: [0, 1, 2, -2, -1]
        assert_eq!(
            fft_shift(&[0.0, 1.0, 2.0, -2.0, -1.0]),
            vec![-2.0, -1.0, 0.0, 1.0, 2.0]
        );
        assert_eq!(shifted_frequencies(4, 4.0), vec![-2.0, -1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_segments_drop_trailing_partial() {
        let processor = StftProcessor::new(8, 8, Detrend::None);
        let samples = vec![Complex32::new(1.0, 0.0); 20];
        let frames = processor.frame_power(&samples, 1.0);
        assert_eq!(frames.columns.len(), 2);
        assert_eq!(frames.segment_len, 8);
    }

    #[test]
    fn test_short_capture_yields_one_segment() {
        let processor = StftProcessor::new(512, 512, Detrend::Constant);
        let samples = vec![Complex32::new(0.5, -0.5); 3];
        let frames = processor.frame_power(&samples, 1_000.0);
        assert_eq!(frames.columns.len(), 1);
        assert_eq!(frames.segment_len, 3);
        assert_eq!(frames.columns[0].len(), 512);
    }

    #[test]
    fn test_constant_detrend_removes_dc() {
        let processor = StftProcessor::new(16, 16, Detrend::Constant);
        let samples = vec![Complex32::new(2.0, 1.0); 16];
        let frames = processor.frame_power(&samples, 1.0);
        let total: f64 = frames.columns[0].iter().sum();
        assert!(total < 1e-20, "DC should be removed, got total power {}", total);
    }
}
