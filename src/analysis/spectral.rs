// SpectralAnalyzer - Welch PSD and log-power spectrogram
//
// Both estimates come from the same STFT framing: the PSD averages the
// per-segment power columns, the spectrogram keeps them as time bins and
// converts each cell to dB with a floor for zero power.

use crate::analysis::stft::{power_to_db, shifted_frequencies, StftFrames, StftProcessor};
use crate::capture::Capture;
use crate::config::SpectralConfig;

/// Welch power spectral density with its frequency axis
#[derive(Debug, Clone, PartialEq)]
pub struct Psd {
    /// Bin frequencies in Hz, ascending
    pub frequencies: Vec<f64>,
    /// Averaged density-scaled power per bin
    pub power: Vec<f64>,
    /// Number of segments averaged
    pub segments: usize,
}

impl Psd {
    /// Frequency spacing between adjacent bins
    pub fn bin_width(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }
}

/// Log-power grid indexed by (frequency bin, time bin)
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramFrame {
    pub frequencies: Vec<f64>,
    /// Segment centre times in seconds
    pub times: Vec<f64>,
    /// Row-major: `values[freq * n_time + time]`, in dB
    values: Vec<f64>,
}

impl SpectrogramFrame {
    /// Build a frame from a row-major grid of dB values
    ///
    /// # Panics
    /// When `values.len() != frequencies.len() * times.len()`.
    pub fn from_grid(frequencies: Vec<f64>, times: Vec<f64>, values: Vec<f64>) -> Self {
        assert_eq!(
            values.len(),
            frequencies.len() * times.len(),
            "spectrogram grid size mismatch"
        );
        Self {
            frequencies,
            times,
            values,
        }
    }

    pub fn n_freq(&self) -> usize {
        self.frequencies.len()
    }

    pub fn n_time(&self) -> usize {
        self.times.len()
    }

    pub fn get(&self, freq: usize, time: usize) -> f64 {
        self.values[freq * self.n_time() + time]
    }

    /// All cells in row-major order
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Computes PSD and spectrogram estimates for complex captures
pub struct SpectralAnalyzer {
    stft: StftProcessor,
    sample_rate: f64,
}

impl SpectralAnalyzer {
    /// Create an analyzer for the given spectral parameters
    pub fn new(config: &SpectralConfig) -> Self {
        Self {
            stft: StftProcessor::new(config.segment_len, config.fft_size, config.detrend),
            sample_rate: config.sample_rate_hz,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Welch averaged periodogram
    pub fn psd(&self, capture: &Capture) -> Psd {
        let frames = self.frames(capture);
        self.average(&frames)
    }

    /// Framed log-power spectrogram
    pub fn spectrogram(&self, capture: &Capture) -> SpectrogramFrame {
        let frames = self.frames(capture);
        self.to_spectrogram(&frames)
    }

    /// PSD and spectrogram from a single STFT pass
    pub fn analyze(&self, capture: &Capture) -> (Psd, SpectrogramFrame) {
        let frames = self.frames(capture);
        (self.average(&frames), self.to_spectrogram(&frames))
    }

    fn frames(&self, capture: &Capture) -> StftFrames {
        self.stft.frame_power(capture.samples(), self.sample_rate)
    }

    fn average(&self, frames: &StftFrames) -> Psd {
        let segments = frames.columns.len();
        let mut power = vec![0.0; frames.fft_size];
        for column in &frames.columns {
            for (acc, p) in power.iter_mut().zip(column.iter()) {
                *acc += p;
            }
        }
        if segments > 0 {
            power.iter_mut().for_each(|p| *p /= segments as f64);
        }

        Psd {
            frequencies: shifted_frequencies(frames.fft_size, self.sample_rate),
            power,
            segments,
        }
    }

    fn to_spectrogram(&self, frames: &StftFrames) -> SpectrogramFrame {
        let n_freq = frames.fft_size;
        let n_time = frames.columns.len();
        let half_segment = frames.segment_len as f64 / 2.0;

        let times = (0..n_time)
            .map(|t| (t as f64 * frames.segment_len as f64 + half_segment) / self.sample_rate)
            .collect();

        let mut values = vec![0.0; n_freq * n_time];
        for (t, column) in frames.columns.iter().enumerate() {
            for (f, &p) in column.iter().enumerate() {
                values[f * n_time + t] = power_to_db(p);
            }
        }

        SpectrogramFrame {
            frequencies: shifted_frequencies(n_freq, self.sample_rate),
            times,
            values,
        }
    }
}
