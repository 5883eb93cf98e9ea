// Types module - the fixed-order capture feature vector
//
// Field order is part of the contract: the scaler, the cluster centroids and
// the label tables all index features positionally through `to_array`.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Number of features per capture
pub const FEATURE_COUNT: usize = 19;

/// Column names in vector order, for external tabulation
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "magnitude_mean",
    "magnitude_std",
    "magnitude_rms",
    "magnitude_peak",
    "crest_factor",
    "peak_frequency_hz",
    "spectral_centroid_hz",
    "spectral_bandwidth_hz",
    "spectrogram_mean_db",
    "spectrogram_std_db",
    "spectrogram_max_db",
    "spectrogram_sum_db",
    "power_intensity",
    "energy_intensity",
    "region_total_area",
    "region_count",
    "region_max_area",
    "region_mean_aspect_ratio",
    "region_mean_eccentricity",
];

/// Features extracted from one capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Mean of |sample|
    pub magnitude_mean: f64,
    /// Population standard deviation of |sample|
    pub magnitude_std: f64,
    pub magnitude_rms: f64,
    pub magnitude_peak: f64,
    /// peak / RMS, 0 for an all-zero capture
    pub crest_factor: f64,

    /// Frequency of the strongest PSD bin in Hz
    pub peak_frequency_hz: f64,
    /// Power-weighted mean frequency in Hz
    pub spectral_centroid_hz: f64,
    /// Power-weighted standard deviation of frequency around the centroid
    pub spectral_bandwidth_hz: f64,

    pub spectrogram_mean_db: f64,
    pub spectrogram_std_db: f64,
    pub spectrogram_max_db: f64,
    /// Sum of every log-power cell
    pub spectrogram_sum_db: f64,

    /// Mean |sample|^2
    pub power_intensity: f64,
    /// Sum of |sample|^2
    pub energy_intensity: f64,

    pub region_total_area: f64,
    pub region_count: f64,
    pub region_max_area: f64,
    pub region_mean_aspect_ratio: f64,
    pub region_mean_eccentricity: f64,
}

impl FeatureVector {
    /// Positional view in [`FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.magnitude_mean,
            self.magnitude_std,
            self.magnitude_rms,
            self.magnitude_peak,
            self.crest_factor,
            self.peak_frequency_hz,
            self.spectral_centroid_hz,
            self.spectral_bandwidth_hz,
            self.spectrogram_mean_db,
            self.spectrogram_std_db,
            self.spectrogram_max_db,
            self.spectrogram_sum_db,
            self.power_intensity,
            self.energy_intensity,
            self.region_total_area,
            self.region_count,
            self.region_max_area,
            self.region_mean_aspect_ratio,
            self.region_mean_eccentricity,
        ]
    }

    /// Rebuild a vector from positional values
    ///
    /// # Errors
    /// `DimensionMismatch` unless `values` has exactly [`FEATURE_COUNT`] entries.
    pub fn from_slice(values: &[f64]) -> Result<Self, ModelError> {
        let v: &[f64; FEATURE_COUNT] =
            values
                .try_into()
                .map_err(|_| ModelError::DimensionMismatch {
                    expected: FEATURE_COUNT,
                    actual: values.len(),
                })?;

        Ok(Self {
            magnitude_mean: v[0],
            magnitude_std: v[1],
            magnitude_rms: v[2],
            magnitude_peak: v[3],
            crest_factor: v[4],
            peak_frequency_hz: v[5],
            spectral_centroid_hz: v[6],
            spectral_bandwidth_hz: v[7],
            spectrogram_mean_db: v[8],
            spectrogram_std_db: v[9],
            spectrogram_max_db: v[10],
            spectrogram_sum_db: v[11],
            power_intensity: v[12],
            energy_intensity: v[13],
            region_total_area: v[14],
            region_count: v[15],
            region_max_area: v[16],
            region_mean_aspect_ratio: v[17],
            region_mean_eccentricity: v[18],
        })
    }

    /// True when every field is finite
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}
