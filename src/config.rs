//! Configuration management for the fingerprinting pipeline
//!
//! This module provides runtime configuration loading from JSON files so
//! the spectral parameters, clustering seeds and label names can be
//! adjusted without recompilation. Defaults reproduce the fixed parameter
//! set the feature vector was designed around (512-point Hann segments,
//! zero overlap, 2-sigma blob threshold).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::clustering::labels::VotePolicy;
use crate::error::ModelError;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub spectral: SpectralConfig,
    #[serde(default)]
    pub morphology: MorphologyConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Per-segment detrending applied before windowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detrend {
    /// Leave segments untouched
    None,
    /// Subtract the segment mean
    Constant,
}

/// Welch PSD / spectrogram parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Capture sample rate in Hz
    pub sample_rate_hz: f64,
    /// Samples per analysis segment
    pub segment_len: usize,
    /// FFT size (>= segment_len, zero padded)
    pub fft_size: usize,
    /// Detrending applied to every segment
    pub detrend: Detrend,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 20e6,
            segment_len: 512,
            fft_size: 512,
            detrend: Detrend::Constant,
        }
    }
}

/// Spectrogram blob detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphologyConfig {
    /// Threshold = grid mean + threshold_sigma * grid std-dev
    pub threshold_sigma: f64,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            threshold_sigma: 2.0,
        }
    }
}

/// Centroid clustering parameters shared by both stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Clusters for controller vs. flying-device separation
    pub class_clusters: usize,
    /// Clusters for identity separation within flying devices
    pub identity_clusters: usize,
    /// RNG seed for centroid initialization
    pub seed: u64,
    /// Number of independent initializations (best inertia wins)
    pub n_init: usize,
    /// Maximum Lloyd iterations per initialization
    pub max_iter: usize,
    /// Convergence tolerance, relative to the mean feature variance
    pub tolerance: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            class_clusters: 2,
            identity_clusters: 4,
            seed: 42,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
        }
    }
}

/// Semantic label names and the vote policy used to resolve them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Stage-1 label of the non-flying class
    pub controller_label: String,
    /// Stage-1 label of the flying super-class
    pub flying_label: String,
    /// Returned when a cluster has no known mapping
    pub unrecognized_label: String,
    pub vote_policy: VotePolicy,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            controller_label: "Controller".to_string(),
            flying_label: "Drone".to_string(),
            unrecognized_label: "Unknown".to_string(),
            vote_policy: VotePolicy::StrictMajority,
        }
    }
}

/// Batch feature extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads used for per-capture extraction (1 = inline)
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the default configuration when the
    /// file is missing or invalid (a warning is logged in that case)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Reject parameter combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: &str| {
            Err(ModelError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        let fs = self.spectral.sample_rate_hz;
        if !fs.is_finite() || fs <= 0.0 {
            return invalid("sample_rate_hz must be > 0");
        }
        if self.spectral.segment_len == 0 {
            return invalid("segment_len must be > 0");
        }
        if self.spectral.fft_size < self.spectral.segment_len {
            return invalid("fft_size must be >= segment_len");
        }
        if !self.morphology.threshold_sigma.is_finite() {
            return invalid("threshold_sigma must be finite");
        }
        if self.clustering.class_clusters == 0 || self.clustering.identity_clusters == 0 {
            return invalid("cluster counts must be > 0");
        }
        if self.clustering.n_init == 0 {
            return invalid("n_init must be > 0");
        }
        if self.clustering.max_iter == 0 {
            return invalid("max_iter must be > 0");
        }
        if self.batch.workers == 0 {
            return invalid("workers must be > 0");
        }
        Ok(())
    }
}
