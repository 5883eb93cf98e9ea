// FeatureExtractor - fixed-length fingerprint of one RF capture
//
// This module turns a complex capture into the 19-field FeatureVector used
// for clustering. Features come from three views of the same capture:
//
// - temporal: statistics of |x[n]| and power/energy intensity
// - spectral: Welch PSD peak/centroid/bandwidth and log-power grid statistics
// - morphology: shape statistics of bright spectrogram regions
//
// Module organization:
// - types: FeatureVector, FEATURE_NAMES
// - temporal: time-domain statistics
// - spectral: PSD and spectrogram statistics
// - mod.rs: Coordinator (FeatureExtractor) and rayon batch extraction
//
// Extraction is deterministic: identical captures and parameters always
// produce identical vectors, and every field is finite. Construction
// validates the analysis parameters, so a zero or non-finite sample rate
// never reaches the spectral stage.

mod spectral;
mod temporal;
mod types;

pub use spectral::{compute_psd_stats, compute_spectrogram_stats, PsdStats, SpectrogramStats};
pub use temporal::{compute_temporal, TemporalStats};
pub use types::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

use std::path::PathBuf;

use rayon::prelude::*;

use crate::analysis::morphology::BlobMorphologyAnalyzer;
use crate::analysis::spectral::SpectralAnalyzer;
use crate::capture::{Capture, SignalLoader};
use crate::config::{AppConfig, SpectralConfig};
use crate::error::{log_capture_error, CaptureError, ModelError};

/// FeatureExtractor coordinates the feature extraction pipeline
///
/// Combines spectral estimation, region morphology and time-domain
/// statistics into a single interface. Holds no per-capture state, so one
/// extractor can be shared across worker threads.
pub struct FeatureExtractor {
    spectral: SpectralAnalyzer,
    morphology: BlobMorphologyAnalyzer,
    workers: usize,
}

impl FeatureExtractor {
    /// Create an extractor with default analysis parameters
    ///
    /// # Arguments
    /// * `sample_rate` - Capture sample rate in Hz
    ///
    /// # Errors
    /// `InvalidConfig` when `sample_rate` is not a finite positive number
    pub fn new(sample_rate: f64) -> Result<Self, ModelError> {
        Self::from_config(&AppConfig {
            spectral: SpectralConfig {
                sample_rate_hz: sample_rate,
                ..SpectralConfig::default()
            },
            ..AppConfig::default()
        })
    }

    /// Build an extractor from a validated configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self {
            spectral: SpectralAnalyzer::new(&config.spectral),
            morphology: BlobMorphologyAnalyzer::new(&config.morphology),
            workers: config.batch.workers.max(1),
        })
    }

    /// Number of worker threads used by the batch methods
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn sample_rate(&self) -> f64 {
        self.spectral.sample_rate()
    }

    /// Extract all features from one capture
    ///
    /// This method coordinates the entire feature extraction pipeline:
    /// 1. Time-domain magnitude statistics
    /// 2. Welch PSD and spectrogram from one STFT pass
    /// 3. PSD and spectrogram statistics
    /// 4. Region morphology of the spectrogram
    pub fn extract(&self, capture: &Capture) -> FeatureVector {
        let temporal = compute_temporal(capture.samples());
        let (psd, frame) = self.spectral.analyze(capture);
        let psd_stats = compute_psd_stats(&psd);
        let grid = compute_spectrogram_stats(&frame);
        let morphology = self.morphology.analyze(&frame);

        FeatureVector {
            magnitude_mean: temporal.mean,
            magnitude_std: temporal.std_dev,
            magnitude_rms: temporal.rms,
            magnitude_peak: temporal.peak,
            crest_factor: temporal.crest_factor,
            peak_frequency_hz: psd_stats.peak_frequency,
            spectral_centroid_hz: psd_stats.centroid,
            spectral_bandwidth_hz: psd_stats.bandwidth,
            spectrogram_mean_db: grid.mean,
            spectrogram_std_db: grid.std_dev,
            spectrogram_max_db: grid.max,
            spectrogram_sum_db: grid.sum,
            power_intensity: temporal.power_intensity,
            energy_intensity: temporal.energy_intensity,
            region_total_area: morphology.total_area,
            region_count: morphology.region_count,
            region_max_area: morphology.max_area,
            region_mean_aspect_ratio: morphology.mean_aspect_ratio,
            region_mean_eccentricity: morphology.mean_eccentricity,
        }
    }

    /// Extract features for many captures; output order equals input order
    pub fn extract_batch(&self, captures: &[Capture]) -> Vec<FeatureVector> {
        self.par_map(captures, |capture| self.extract(capture))
    }

    /// Load and extract each capture (a list of files) in order
    ///
    /// A load failure is reported for that capture only; the rest of the
    /// batch is still extracted.
    pub fn extract_files_batch(
        &self,
        loader: &SignalLoader,
        captures: &[Vec<PathBuf>],
    ) -> Vec<Result<FeatureVector, CaptureError>> {
        self.par_map(captures, |paths| {
            loader
                .load(paths.as_slice())
                .map(|capture| self.extract(&capture))
                .map_err(|err| {
                    log_capture_error(&err, "extract_files_batch");
                    err
                })
        })
    }

    /// Map `f` over `items` on a pool of `workers` threads
    ///
    /// Indexed parallel iterators collect in input order. A single worker
    /// (or a single item) runs inline on the calling thread.
    fn par_map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        if self.workers <= 1 || items.len() <= 1 {
            return items.iter().map(f).collect();
        }

        let run = || -> Vec<R> { items.par_iter().map(&f).collect() };
        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(err) => {
                tracing::warn!(%err, workers = self.workers, "Falling back to the global rayon pool");
                run()
            }
        };

        tracing::debug!(items = items.len(), workers = self.workers, "Batch complete");
        results
    }
}

#[cfg(test)]
mod tests;
