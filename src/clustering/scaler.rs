// StandardScaler - per-column zero-mean, unit-variance standardization
//
// Fitted once from a training matrix and then frozen: transform never
// updates the stored mean or scale. Columns whose spread is at rounding
// level use a unit scale so constant features standardize to 0 instead of
// dividing by zero.

use serde::{Deserialize, Serialize};

use super::matrix::FeatureMatrix;
use crate::error::ModelError;

/// Fitted per-column mean and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit mean and population standard deviation of every column
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self, ModelError> {
        if matrix.is_empty() {
            return Err(ModelError::EmptyMatrix);
        }

        let (mean, std) = matrix.column_stats();
        let scale = mean
            .iter()
            .zip(std)
            .map(|(m, s)| {
                let tolerance = 10.0 * f64::EPSILON * m.abs().max(1.0);
                if s > tolerance {
                    s
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Standardize one row with the fitted parameters
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    /// Map a standardized row back to feature units
    pub fn inverse_transform_row(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(z, (m, s))| z * s + m)
            .collect())
    }

    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, ModelError> {
        self.map_rows(matrix, |row| self.transform_row(row))
    }

    pub fn inverse_transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, ModelError> {
        self.map_rows(matrix, |row| self.inverse_transform_row(row))
    }

    fn map_rows<F>(&self, matrix: &FeatureMatrix, f: F) -> Result<FeatureMatrix, ModelError>
    where
        F: Fn(&[f64]) -> Result<Vec<f64>, ModelError>,
    {
        self.check_width(matrix.n_cols())?;
        let mut out = FeatureMatrix::new(matrix.n_cols());
        for row in matrix.rows() {
            out.push_row(&f(row)?)?;
        }
        Ok(out)
    }

    fn check_width(&self, actual: usize) -> Result<(), ModelError> {
        if actual != self.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> FeatureMatrix {
        FeatureMatrix::from_rows(&[
            vec![1.0, 10.0, 3.0],
            vec![2.0, 20.0, 3.0],
            vec![3.0, 60.0, 3.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_standardized_columns_have_zero_mean_unit_std() {
        let m = matrix();
        let scaler = StandardScaler::fit(&m).unwrap();
        let z = scaler.transform(&m).unwrap();
        let (mean, std) = z.column_stats();

        for c in 0..2 {
            assert!(mean[c].abs() < 1e-12);
            assert!((std[c] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_column_uses_unit_scale() {
        let scaler = StandardScaler::fit(&matrix()).unwrap();
        assert_eq!(scaler.scale()[2], 1.0);

        let z = scaler.transform_row(&[2.0, 30.0, 3.0]).unwrap();
        assert!(z.iter().all(|v| v.is_finite()));
        assert_eq!(z[2], 0.0);
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = matrix();
        let scaler = StandardScaler::fit(&m).unwrap();
        let back = scaler
            .inverse_transform(&scaler.transform(&m).unwrap())
            .unwrap();

        for (a, b) in m.rows().zip(back.rows()) {
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = StandardScaler::fit(&matrix()).unwrap();
        assert_eq!(
            scaler.transform_row(&[1.0]).unwrap_err(),
            ModelError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn test_empty_matrix_rejected() {
        assert_eq!(
            StandardScaler::fit(&FeatureMatrix::new(3)).unwrap_err(),
            ModelError::EmptyMatrix
        );
    }
}
