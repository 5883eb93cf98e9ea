// ClusterModel - standardize then k-means, frozen after fit
//
// The fitted scaler and centroids are one owned value. `fit` replaces it
// wholesale; `predict` only reads it, so standardization parameters never
// change between fit and predict on the same instance.

use serde::{Deserialize, Serialize};

use super::kmeans::{self, nearest_centroid, KMeansParams};
use super::matrix::FeatureMatrix;
use super::scaler::StandardScaler;
use crate::config::ClusteringConfig;
use crate::error::ModelError;

/// Fitted state kept for inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedClusters {
    pub scaler: StandardScaler,
    /// Centroids in standardized feature space
    pub centroids: Vec<Vec<f64>>,
    pub inertia: f64,
}

/// Everything a fit produced, including per-row assignments
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterFit {
    pub scaler: StandardScaler,
    pub centroids: Vec<Vec<f64>>,
    /// Cluster index for every training row, in row order
    pub assignments: Vec<usize>,
    pub inertia: f64,
}

/// k-cluster model over standardized feature vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterModel {
    k: usize,
    n_init: usize,
    max_iter: usize,
    tolerance: f64,
    seed: u64,
    fitted: Option<FittedClusters>,
}

impl ClusterModel {
    /// Unfitted model with `k` clusters and the run parameters of `config`
    pub fn new(k: usize, config: &ClusteringConfig) -> Self {
        Self {
            k,
            n_init: config.n_init,
            max_iter: config.max_iter,
            tolerance: config.tolerance,
            seed: config.seed,
            fitted: None,
        }
    }

    /// Controller vs. flying device separation
    pub fn class_stage(config: &ClusteringConfig) -> Self {
        Self::new(config.class_clusters, config)
    }

    /// Identity separation among flying devices
    pub fn identity_stage(config: &ClusteringConfig) -> Self {
        Self::new(config.identity_clusters, config)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn fitted(&self) -> Option<&FittedClusters> {
        self.fitted.as_ref()
    }

    /// Fit scaler and centroids to `matrix`
    ///
    /// # Errors
    /// - `InvalidConfig` when k is 0
    /// - `InsufficientRows` when the matrix has fewer rows than k
    /// - `NonFiniteFeature` when any training value is NaN or infinite
    pub fn fit(&mut self, matrix: &FeatureMatrix) -> Result<ClusterFit, ModelError> {
        if self.k == 0 {
            return Err(ModelError::InvalidConfig {
                reason: "cluster count must be > 0".to_string(),
            });
        }
        if matrix.n_rows() < self.k {
            return Err(ModelError::InsufficientRows {
                required: self.k,
                available: matrix.n_rows(),
            });
        }
        for (row, values) in matrix.rows().enumerate() {
            if let Some(column) = first_non_finite(values) {
                return Err(ModelError::NonFiniteFeature { row, column });
            }
        }

        let scaler = StandardScaler::fit(matrix)?;
        let standardized = scaler.transform(matrix)?;
        let result = kmeans::fit(
            &standardized,
            &KMeansParams {
                k: self.k,
                n_init: self.n_init,
                max_iter: self.max_iter,
                tolerance: self.tolerance,
                seed: self.seed,
            },
        );

        tracing::info!(
            k = self.k,
            rows = matrix.n_rows(),
            inertia = result.inertia,
            iterations = result.iterations,
            "Cluster model fitted"
        );

        self.fitted = Some(FittedClusters {
            scaler: scaler.clone(),
            centroids: result.centroids.clone(),
            inertia: result.inertia,
        });

        Ok(ClusterFit {
            scaler,
            centroids: result.centroids,
            assignments: result.assignments,
            inertia: result.inertia,
        })
    }

    /// Assign one feature row to its nearest centroid
    ///
    /// # Errors
    /// `NotFitted` before `fit`, `DimensionMismatch` for a row of the wrong width,
    /// `NonFiniteFeature` (row 0) when the standardized row holds NaN or inf.
    pub fn predict(&self, row: &[f64]) -> Result<usize, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        let z = fitted.scaler.transform_row(row)?;
        if let Some(column) = first_non_finite(&z) {
            return Err(ModelError::NonFiniteFeature { row: 0, column });
        }
        Ok(nearest_centroid(&fitted.centroids, &z).0)
    }

    pub fn predict_matrix(&self, matrix: &FeatureMatrix) -> Result<Vec<usize>, ModelError> {
        matrix
            .rows()
            .enumerate()
            .map(|(index, row)| {
                self.predict(row).map_err(|err| match err {
                    ModelError::NonFiniteFeature { column, .. } => {
                        ModelError::NonFiniteFeature { row: index, column }
                    }
                    other => other,
                })
            })
            .collect()
    }

    /// Centroids mapped back to feature units
    pub fn centroids_in_feature_space(&self) -> Result<Vec<Vec<f64>>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        fitted
            .centroids
            .iter()
            .map(|c| fitted.scaler.inverse_transform_row(c))
            .collect()
    }
}

fn first_non_finite(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| !v.is_finite())
}
